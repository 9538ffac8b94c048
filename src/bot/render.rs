//! Rendering of donations and the tally board into Discord messages.
//!
//! Text is assembled by plain functions so it can be tested without a gateway; the
//! embed builders only arrange that text.

use crate::core::{
    counter::BoardFrame,
    donation::DonationRecord,
    format::{format_count, format_rupiah},
    totals::{Totals, format_progress_bar},
};
use poise::serenity_prelude as serenity;

/// Most donations listed by `/donations`, to stay under the message size limit
pub const LIST_LIMIT: usize = 15;

/// Length of the progress bar under the board
const BAR_LENGTH: usize = 20;

const BOARD_COLOR: u32 = 0x00F5_A623;

/// One donation as a list entry: id, amount, donor, time and the quoted message.
#[must_use]
pub fn donation_line(record: &DonationRecord) -> String {
    let mut line = format!(
        "`{}` **{}** from **{}** · {}",
        record.id,
        format_rupiah(record.amount),
        record.donor,
        record.timestamp.format("%d/%m/%Y %H:%M UTC")
    );
    if let Some(message) = &record.message {
        line.push_str("\n> ");
        line.push_str(message);
    }
    line
}

/// The `/donations` listing, newest first, capped at `limit` entries.
#[must_use]
pub fn donation_list(listing: &[&DonationRecord], totals: &Totals, limit: usize) -> String {
    if listing.is_empty() {
        return "📭 No donations yet. Add one with `/donate`!".to_string();
    }

    let mut text = format!(
        "**🧾 Donations** ({} total, {})\n\n",
        totals.donor_count,
        format_rupiah(totals.total_amount)
    );
    let shown: Vec<String> = listing
        .iter()
        .take(limit)
        .map(|record| donation_line(record))
        .collect();
    text.push_str(&shown.join("\n"));

    let hidden = listing.len().saturating_sub(limit);
    if hidden > 0 {
        text.push_str(&format!("\n\n…and {hidden} older donation(s)"));
    }
    text
}

/// Field texts of the tally board as (name, value, inline) triples.
///
/// Counters show the animated frame; the progress bar always reflects the real totals.
#[must_use]
pub fn board_fields(frame: &BoardFrame, totals: &Totals) -> Vec<(String, String, bool)> {
    let progress = totals.progress_percent();
    vec![
        (
            "💰 Total Donations".to_string(),
            format_rupiah(frame.total_amount),
            true,
        ),
        (
            "🙋 Donors".to_string(),
            format_count(frame.donor_count, true),
            true,
        ),
        (
            "🎯 Monthly Goal".to_string(),
            format_rupiah(frame.goal),
            true,
        ),
        (
            "Progress".to_string(),
            format_progress_bar(progress, Some(BAR_LENGTH)),
            false,
        ),
    ]
}

/// The tally board as an embed.
#[must_use]
pub fn board_embed(frame: &BoardFrame, totals: &Totals) -> serenity::CreateEmbed {
    serenity::CreateEmbed::default()
        .title("📊 Donation Tally")
        .color(BOARD_COLOR)
        .fields(board_fields(frame, totals))
}
