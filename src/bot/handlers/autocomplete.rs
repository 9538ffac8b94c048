//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are read from the store on every keystroke, so they always reflect the
//! latest write from any tab.

use crate::{
    bot::BotData,
    core::{donation::DonationRecord, store::DonationRepository},
    errors::Error,
};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for donation ids.
///
/// Matches the partial input against ids and donor names (case-insensitive) and returns
/// the ids of matching donations, newest first.
///
/// # Arguments
/// * `ctx` - The poise context holding the bot's tab
/// * `partial` - The partial string the user has typed so far
pub async fn autocomplete_donation_id(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(donations) = ctx.data().store().load().await else {
        return Vec::new();
    };
    matching_ids(donations, partial)
}

fn matching_ids(mut donations: Vec<DonationRecord>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    donations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    donations
        .into_iter()
        .filter(|d| d.id.contains(partial) || d.donor.to_lowercase().contains(&partial_lower))
        .map(|d| d.id)
        .take(MAX_SUGGESTIONS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_record;

    #[test]
    fn test_matches_id_or_donor_newest_first() {
        let donations = vec![
            sample_record("1000", 10, "Alice"),
            sample_record("2000", 20, "Budi"),
            sample_record("3000", 30, "alina"),
        ];

        assert_eq!(matching_ids(donations.clone(), "ALI"), vec!["3000", "1000"]);
        assert_eq!(matching_ids(donations.clone(), "20"), vec!["2000"]);
        assert_eq!(matching_ids(donations, ""), vec!["3000", "2000", "1000"]);
    }

    #[test]
    fn test_suggestions_are_capped() {
        let donations = (0..40)
            .map(|i| sample_record(&(1000 + i).to_string(), 1, "Citra"))
            .collect();
        assert_eq!(matching_ids(donations, "citra").len(), MAX_SUGGESTIONS);
    }
}
