//! Mutation view - the "manage donations" page.
//!
//! The view keeps its own copy of the collection, loaded when it is mounted. Adding or
//! deleting a donation rewrites the whole collection from that copy and then dispatches
//! the same-document `donationsUpdated` event, because storage events never reach the
//! tab that wrote. If another tab wrote in between, its change is overwritten: last full
//! write wins.

use crate::{
    config::settings::TallySettings,
    core::{
        donation::{DonationRecord, NewDonation},
        format::format_amount_input,
        notify::{DONATIONS_UPDATED, PageEvents},
        store::DonationRepository,
        totals::Totals,
    },
    errors::Result,
};
use chrono::Utc;
use std::future::Future;
use tracing::{debug, info};

/// Prompt shown before a donation is deleted
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this donation?";

/// Interactive yes/no confirmation.
pub trait Confirm: Sync {
    /// Asks the user to confirm `prompt`.
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send;
}

/// A decision made ahead of time.
impl Confirm for bool {
    async fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

/// Raw contents of the add-donation form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationForm {
    /// Amount as displayed, e.g. `"50.000"`
    pub amount: String,
    /// Donor name as typed
    pub donor: String,
    /// Message as typed
    pub message: String,
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was removed and the collection saved
    Deleted(DonationRecord),
    /// The user declined; nothing changed
    Declined,
    /// No record has that id; nothing changed
    NotFound,
}

/// The page that adds and removes donations.
pub struct MutationView<R> {
    repo: R,
    page: PageEvents,
    donations: Vec<DonationRecord>,
    form: DonationForm,
    max_message_len: usize,
}

impl<R: DonationRepository> MutationView<R> {
    /// Mounts the page: loads the current collection from `repo`.
    pub async fn mount(repo: R, page: PageEvents, settings: &TallySettings) -> Result<Self> {
        let donations = repo.load().await?;
        debug!("Mutation view mounted with {} donations", donations.len());
        Ok(Self {
            repo,
            page,
            donations,
            form: DonationForm::default(),
            max_message_len: settings.max_message_len,
        })
    }

    /// Current form contents
    #[must_use]
    pub const fn form(&self) -> &DonationForm {
        &self.form
    }

    /// Amount field keystroke: re-renders the value with thousand separators.
    pub fn set_amount_input(&mut self, text: &str) {
        self.form.amount = format_amount_input(text);
    }

    /// Donor field keystroke
    pub fn set_donor(&mut self, donor: &str) {
        self.form.donor = donor.to_string();
    }

    /// Message field keystroke. Input past the length limit is cut off.
    pub fn set_message(&mut self, message: &str) {
        self.form.message = message.chars().take(self.max_message_len).collect();
    }

    /// Submits the form. Fields are cleared only when the donation was added.
    pub async fn submit(&mut self) -> Result<DonationRecord> {
        let DonationForm {
            amount,
            donor,
            message,
        } = self.form.clone();
        self.add_donation(&amount, &donor, Some(&message)).await
    }

    /// Validates input, appends a new record, saves the collection and notifies the page.
    ///
    /// Nothing is written when validation fails.
    pub async fn add_donation(
        &mut self,
        amount_text: &str,
        donor: &str,
        message: Option<&str>,
    ) -> Result<DonationRecord> {
        let donation = NewDonation::parse(amount_text, donor, message, self.max_message_len)?;
        let record = donation.into_record(Utc::now(), &self.donations);

        let mut updated = self.donations.clone();
        updated.push(record.clone());
        self.repo.save(&updated).await?;
        self.donations = updated;

        self.page.dispatch_custom(DONATIONS_UPDATED);
        self.form = DonationForm::default();

        info!(
            "Added donation {} of {} from {:?}",
            record.id, record.amount, record.donor
        );
        Ok(record)
    }

    /// Deletes the record with `id` after confirmation.
    pub async fn delete_donation<C: Confirm>(
        &mut self,
        id: &str,
        confirm: &C,
    ) -> Result<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT).await {
            debug!("Deletion of {} declined", id);
            return Ok(DeleteOutcome::Declined);
        }

        let Some(removed) = self.donations.iter().find(|d| d.id == id).cloned() else {
            debug!("Deletion of {} ignored, no such donation", id);
            return Ok(DeleteOutcome::NotFound);
        };

        // Ids are timestamps, so records written in the same millisecond share one
        let mut updated = self.donations.clone();
        updated.retain(|d| d.id != id);
        self.repo.save(&updated).await?;
        self.donations = updated;

        self.page.dispatch_custom(DONATIONS_UPDATED);

        info!("Deleted donation {} from {:?}", removed.id, removed.donor);
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// The view's copy of the collection, in stored order
    #[must_use]
    pub fn donations(&self) -> &[DonationRecord] {
        &self.donations
    }

    /// Looks up a record by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&DonationRecord> {
        self.donations.iter().find(|d| d.id == id)
    }

    /// Records newest first, as the page lists them
    #[must_use]
    pub fn listing(&self) -> Vec<&DonationRecord> {
        let mut listing: Vec<&DonationRecord> = self.donations.iter().collect();
        listing.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        listing
    }

    /// Aggregates of the view's copy
    #[must_use]
    pub fn totals(&self, goal: u64) -> Totals {
        Totals::from_records(&self.donations, goal)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::notify::ReloadCause;
    use crate::core::store::{DONATIONS_KEY, DonationStore};
    use crate::errors::Error;
    use crate::test_utils::*;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn mount_view(tab: &crate::core::origin::Tab) -> Result<MutationView<DonationStore>> {
        MutationView::mount(
            tab.donation_store(DONATIONS_KEY),
            tab.page().clone(),
            &TallySettings::default(),
        )
        .await
    }

    #[tokio::test]
    async fn test_add_donation_from_empty_collection() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let mut view = mount_view(&tab).await?;

        let before = Utc::now() - ChronoDuration::milliseconds(1);
        let record = view.add_donation("50.000", "Alice", None).await?;
        let after = Utc::now();

        assert_eq!(record.amount, 50_000);
        assert_eq!(record.donor, "Alice");
        assert_eq!(record.message, None);
        assert!(record.timestamp >= before && record.timestamp <= after);

        let stored = tab.donation_store(DONATIONS_KEY).load().await?;
        assert_eq!(stored, vec![record]);
        assert_eq!(view.donations().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_donation_dispatches_local_update() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let mut feed = tab.change_feed(DONATIONS_KEY);
        let mut view = mount_view(&tab).await?;

        view.add_donation("10.000", "Budi", Some("Semangat")).await?;

        let cause = timeout(Duration::from_secs(1), feed.next()).await.unwrap();
        assert_eq!(cause, Some(ReloadCause::LocalUpdate));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let mut view = mount_view(&tab).await?;

        let missing_amount = view.add_donation("", "Alice", None).await;
        assert!(matches!(missing_amount, Err(Error::InvalidAmount { .. })));

        let zero_amount = view.add_donation("0", "Alice", None).await;
        assert!(matches!(zero_amount, Err(Error::InvalidAmount { .. })));

        let missing_donor = view.add_donation("5.000", "  ", None).await;
        assert!(matches!(missing_donor, Err(Error::MissingDonor)));

        assert!(view.donations().is_empty());
        assert_eq!(tab.storage().get_item(DONATIONS_KEY).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_clears_form_only_on_success() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let mut view = mount_view(&tab).await?;

        view.set_amount_input("25000");
        view.set_message("Untuk anak-anak");
        assert_eq!(view.form().amount, "25.000");

        assert!(matches!(view.submit().await, Err(Error::MissingDonor)));
        assert_eq!(view.form().amount, "25.000");

        view.set_donor("Citra");
        let record = view.submit().await?;
        assert_eq!(record.amount, 25_000);
        assert_eq!(record.message.as_deref(), Some("Untuk anak-anak"));
        assert_eq!(view.form(), &DonationForm::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_message_input_is_cut_at_limit() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let mut view = mount_view(&tab).await?;

        view.set_message(&"x".repeat(250));
        assert_eq!(view.form().message.chars().count(), 200);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_first_of_two() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let first = sample_record("1704096000000", 10_000, "Alice");
        let second = sample_record("1704096000001", 20_000, "Budi");
        seed_donations(&tab, &[first.clone(), second.clone()]).await?;

        let mut view = mount_view(&tab).await?;
        let outcome = view.delete_donation(&first.id, &true).await?;

        assert_eq!(outcome, DeleteOutcome::Deleted(first));
        assert_eq!(view.donations(), &[second.clone()]);
        assert_eq!(tab.donation_store(DONATIONS_KEY).load().await?, vec![second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_every_record_sharing_the_id() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let first = sample_record("1704096000000", 10_000, "Alice");
        let twin = sample_record("1704096000000", 30_000, "Citra");
        let other = sample_record("1704096000001", 20_000, "Budi");
        seed_donations(&tab, &[first.clone(), other.clone(), twin]).await?;

        let mut view = mount_view(&tab).await?;
        let outcome = view.delete_donation(&first.id, &true).await?;

        assert_eq!(outcome, DeleteOutcome::Deleted(first));
        assert_eq!(view.donations(), &[other.clone()]);
        assert_eq!(tab.donation_store(DONATIONS_KEY).load().await?, vec![other]);
        Ok(())
    }

    #[tokio::test]
    async fn test_declined_delete_has_no_side_effect() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let record = sample_record("1", 10_000, "Alice");
        seed_donations(&tab, std::slice::from_ref(&record)).await?;
        let mut feed = tab.change_feed(DONATIONS_KEY);

        let mut view = mount_view(&tab).await?;
        let outcome = view.delete_donation(&record.id, &false).await?;

        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(tab.donation_store(DONATIONS_KEY).load().await?, vec![record]);
        assert!(
            timeout(Duration::from_millis(50), feed.next())
                .await
                .is_err()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_silent_noop() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let record = sample_record("1", 10_000, "Alice");
        seed_donations(&tab, std::slice::from_ref(&record)).await?;

        let mut view = mount_view(&tab).await?;
        let outcome = view.delete_donation("404", &true).await?;

        assert_eq!(outcome, DeleteOutcome::NotFound);
        assert_eq!(view.donations(), &[record]);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        seed_donations(
            &tab,
            &[
                sample_record("1704096000000", 1, "Old"),
                sample_record("1704096000500", 2, "Newest"),
                sample_record("1704096000200", 3, "Middle"),
            ],
        )
        .await?;

        let view = mount_view(&tab).await?;
        let donors: Vec<&str> = view.listing().iter().map(|d| d.donor.as_str()).collect();
        assert_eq!(donors, ["Newest", "Middle", "Old"]);
        assert_eq!(view.totals(100).total_amount, 6);
        assert!(view.find("1704096000200").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_copy_overwrites_other_tab() -> Result<()> {
        let (origin, first_tab) = setup_with_tab().await?;
        let second_tab = origin.open_tab();

        let mut first = mount_view(&first_tab).await?;
        let mut second = mount_view(&second_tab).await?;

        first.add_donation("1.000", "Alice", None).await?;
        second.add_donation("2.000", "Budi", None).await?;

        // Last full write wins: the second tab never saw Alice's donation.
        let stored = first_tab.donation_store(DONATIONS_KEY).load().await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].donor, "Budi");
        Ok(())
    }
}
