//! Number formatting for amounts and counts (Indonesian conventions).

use num_format::{Locale, ToFormattedString};

/// Groups thousands with the Indonesian separator: `50000` -> `50.000`.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    value.to_formatted_string(&Locale::id)
}

/// Formats an amount in Rupiah: `50000` -> `Rp 50.000`.
#[must_use]
pub fn format_rupiah(amount: u64) -> String {
    format!("Rp {}", group_thousands(amount))
}

/// Live formatting for the amount field, applied on every keystroke.
///
/// Non-digits are dropped and the value is re-rendered with separators. An empty field
/// renders as `0`, and values beyond `u64::MAX` saturate.
#[must_use]
pub fn format_amount_input(text: &str) -> String {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_start_matches('0');
    let value = if trimmed.is_empty() {
        0
    } else {
        trimmed.parse::<u64>().unwrap_or(u64::MAX)
    };
    group_thousands(value)
}

/// Formats a donor count, with a trailing `+` once it is non-zero.
#[must_use]
pub fn format_count(count: u64, show_plus: bool) -> String {
    let grouped = group_thousands(count);
    if show_plus && count > 0 {
        format!("{grouped}+")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(50_000), "50.000");
        assert_eq!(group_thousands(50_000_000), "50.000.000");
    }

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(1_250_000), "Rp 1.250.000");
    }

    #[test]
    fn test_format_amount_input_strips_and_regroups() {
        assert_eq!(format_amount_input("50000"), "50.000");
        assert_eq!(format_amount_input("50.0001"), "500.001");
        assert_eq!(format_amount_input("Rp 12a3"), "123");
        assert_eq!(format_amount_input("007"), "7");
    }

    #[test]
    fn test_format_amount_input_empty_and_huge() {
        assert_eq!(format_amount_input(""), "0");
        assert_eq!(format_amount_input("abc"), "0");
        assert_eq!(
            format_amount_input("999999999999999999999999"),
            group_thousands(u64::MAX)
        );
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0, true), "0");
        assert_eq!(format_count(1_200, true), "1.200+");
        assert_eq!(format_count(12, false), "12");
    }
}
