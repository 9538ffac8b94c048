//! Display view - the tally board.
//!
//! The view caches the collection for rendering and re-reads it wholesale whenever the
//! notification channel reports a possible change. Reloading is idempotent, so redundant
//! or reordered signals are harmless. After every reload a generation number is
//! published; renderers own their [`Board`] and retarget it when the generation moves.

use crate::{
    config::settings::Settings,
    core::{
        counter::{Board, CounterTiming},
        donation::DonationRecord,
        notify::{ChangeFeed, ReloadCause},
        store::DonationRepository,
        totals::Totals,
    },
    errors::Result,
};
use std::sync::Arc;
use tokio::{
    sync::{RwLock, watch},
    task::JoinHandle,
};
use tracing::{error, info, trace};

/// Display view shared between the sync loop and renderers
pub type SharedDisplay<R> = Arc<RwLock<DisplayView<R>>>;

/// The page that shows running totals.
pub struct DisplayView<R> {
    repo: R,
    donations: Vec<DonationRecord>,
    goal: u64,
    timing: CounterTiming,
    reloads: watch::Sender<u64>,
}

impl<R: DonationRepository> DisplayView<R> {
    /// Mounts the page: loads the collection into the cache.
    pub async fn mount(repo: R, settings: &Settings) -> Result<Self> {
        let donations = repo.load().await?;
        let goal = settings.tally.monthly_goal;
        let totals = Totals::from_records(&donations, goal);
        let (reloads, _) = watch::channel(0);
        info!(
            "Display view mounted with {} donations totalling {}",
            totals.donor_count, totals.total_amount
        );
        Ok(Self {
            repo,
            donations,
            goal,
            timing: CounterTiming::from_settings(&settings.counter),
            reloads,
        })
    }

    /// Re-reads the collection and replaces the cache wholesale.
    pub async fn reload_donations(&mut self) -> Result<()> {
        let donations = self.repo.load().await?;
        self.donations = donations;

        let totals = self.totals();
        self.reloads.send_modify(|generation| *generation += 1);

        info!(
            "Donations cache reloaded with {} items, total {}",
            totals.donor_count, totals.total_amount
        );
        trace!("Donations cache now contains: {:?}", self.donations);
        Ok(())
    }

    /// Waits for the next change signal and reloads. Returns `None` when the feed ends.
    pub async fn sync(&mut self, feed: &mut ChangeFeed) -> Result<Option<ReloadCause>> {
        let Some(cause) = feed.next().await else {
            return Ok(None);
        };
        self.reload_donations().await?;
        Ok(Some(cause))
    }

    /// Cached collection
    #[must_use]
    pub fn donations(&self) -> &[DonationRecord] {
        &self.donations
    }

    /// Aggregates of the cached collection
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals::from_records(&self.donations, self.goal)
    }

    /// A fresh idle board targeting the current totals
    #[must_use]
    pub fn new_board(&self) -> Board {
        Board::new(&self.totals(), self.timing)
    }

    /// Receiver that changes after every reload
    #[must_use]
    pub fn subscribe_reloads(&self) -> watch::Receiver<u64> {
        self.reloads.subscribe()
    }
}

/// Keeps a shared display view in sync with `feed` on a background task.
///
/// Reload failures are logged and the loop keeps listening. The task ends when every
/// signal source of the feed is closed.
pub fn spawn_sync_loop<R>(view: SharedDisplay<R>, mut feed: ChangeFeed) -> JoinHandle<()>
where
    R: DonationRepository + 'static,
{
    tokio::spawn(async move {
        info!("Display sync loop watching {:?}", feed.key());
        while let Some(cause) = feed.next().await {
            info!("Reloading donations: {:?}", cause);
            let mut guard = view.write().await;
            if let Err(e) = guard.reload_donations().await {
                error!("Failed to reload donations after {:?}: {}", cause, e);
            }
        }
        info!("Display sync loop stopped, all signal sources closed");
    })
}
