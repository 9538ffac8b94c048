//! Derived aggregates over the donation collection.
//!
//! Nothing here is persisted: totals are recomputed from the current collection every
//! time a view reloads.

use crate::core::donation::DonationRecord;

/// Aggregates shown on the tally board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Sum of all donation amounts
    pub total_amount: u64,
    /// Number of donations in the collection
    pub donor_count: usize,
    /// Configured fundraising goal
    pub goal: u64,
}

impl Totals {
    /// Computes totals for `records` against `goal`.
    ///
    /// The sum saturates instead of wrapping on absurd collections.
    #[must_use]
    pub fn from_records(records: &[DonationRecord], goal: u64) -> Self {
        let total_amount = records
            .iter()
            .fold(0_u64, |sum, record| sum.saturating_add(record.amount));
        Self {
            total_amount,
            donor_count: records.len(),
            goal,
        }
    }

    /// Progress toward the goal as a percentage (can exceed 100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        calculate_progress(self.total_amount, self.goal)
    }
}

/// Calculates how much of `goal` has been raised, in percent.
///
/// A zero goal reports 0% rather than dividing by zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_progress(raised: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 0.0;
    }

    (raised as f64 / goal as f64) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage; the bar is clamped to 0-100
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);
    // clamped_progress is in [0, 100] and length is small, so the result fits in [0, length].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_totals_sum_and_count() {
        let records = vec![
            sample_record("1", 50_000, "Alice"),
            sample_record("2", 125_000, "Budi"),
            sample_record("3", 25_000, "Alice"),
        ];

        let totals = Totals::from_records(&records, 50_000_000);
        assert_eq!(totals.total_amount, 200_000);
        assert_eq!(totals.donor_count, 3);
        assert_eq!(totals.goal, 50_000_000);
    }

    #[test]
    fn test_totals_empty_collection() {
        let totals = Totals::from_records(&[], 1_000);
        assert_eq!(totals.total_amount, 0);
        assert_eq!(totals.donor_count, 0);
        assert_eq!(totals.progress_percent(), 0.0);
    }

    #[test]
    fn test_totals_saturate() {
        let records = vec![
            sample_record("1", u64::MAX, "Alice"),
            sample_record("2", 10, "Budi"),
        ];
        assert_eq!(Totals::from_records(&records, 1).total_amount, u64::MAX);
    }

    #[test]
    fn test_calculate_progress() {
        assert_eq!(calculate_progress(25, 100), 25.0);
        assert_eq!(calculate_progress(150, 100), 150.0);
        assert_eq!(calculate_progress(50, 0), 0.0);
    }

    #[test]
    fn test_format_progress_bar_half() {
        assert_eq!(format_progress_bar(50.0, Some(10)), "[█████░░░░░] 50.0%");
    }

    #[test]
    fn test_format_progress_bar_overfunded() {
        // The bar stays full while the label shows the real figure
        assert_eq!(format_progress_bar(150.0, Some(4)), "[████] 150.0%");
    }

    #[test]
    fn test_format_progress_bar_zero() {
        assert_eq!(format_progress_bar(0.0, None), "[░░░░░░░░░░] 0.0%");
    }
}
