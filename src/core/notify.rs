//! Notification channel - "the data may have changed, reload it".
//!
//! Three independent producers can announce a change to the donation collection:
//!
//! 1. storage events written by another tab of the same origin,
//! 2. the same-document `donationsUpdated` custom event dispatched after a local write,
//! 3. the page becoming visible again.
//!
//! [`ChangeFeed`] merges them into a single stream of [`ReloadCause`]s so views never
//! special-case where a signal came from. No ordering is guaranteed between sources;
//! every cause leads to a full reload of the stored collection, which makes duplicates
//! and reordering harmless.

use crate::core::storage::{StorageEvent, StorageEvents};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Name of the custom event dispatched after a successful local write
pub const DONATIONS_UPDATED: &str = "donationsUpdated";

const PAGE_EVENT_CAPACITY: usize = 64;

/// Document visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The page is shown
    Visible,
    /// The page is in the background
    Hidden,
}

/// Event dispatched on a tab's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Payload-less custom event
    Custom(String),
    /// Document visibility transition
    VisibilityChanged(Visibility),
}

/// Why a view should reload its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadCause {
    /// Another tab wrote the watched key
    StorageChanged,
    /// This page wrote the collection and dispatched `donationsUpdated`
    LocalUpdate,
    /// The page became visible again
    BecameVisible,
}

/// A tab's page event target (custom events and visibility).
#[derive(Clone)]
pub struct PageEvents {
    sender: broadcast::Sender<PageEvent>,
    hidden: Arc<AtomicBool>,
}

impl Default for PageEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl PageEvents {
    /// Creates a visible page with no listeners.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(PAGE_EVENT_CAPACITY);
        Self {
            sender,
            hidden: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Dispatches a payload-less custom event to this page's listeners.
    pub fn dispatch_custom(&self, name: &str) {
        let delivered = self
            .sender
            .send(PageEvent::Custom(name.to_string()))
            .unwrap_or(0);
        debug!("Dispatched {:?} to {} listeners", name, delivered);
    }

    /// Records a visibility change. Only real transitions are dispatched.
    pub fn set_visibility(&self, visibility: Visibility) {
        let hidden = visibility == Visibility::Hidden;
        if self.hidden.swap(hidden, Ordering::SeqCst) == hidden {
            return;
        }
        let delivered = self
            .sender
            .send(PageEvent::VisibilityChanged(visibility))
            .unwrap_or(0);
        debug!("Page became {:?}; {} listeners notified", visibility, delivered);
    }

    /// Current visibility of the page
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        if self.hidden.load(Ordering::SeqCst) {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    /// Subscribes to events dispatched on this page.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }
}

/// Unified stream of reload causes for one watched storage key.
pub struct ChangeFeed {
    key: String,
    storage: StorageEvents,
    page: broadcast::Receiver<PageEvent>,
    storage_closed: bool,
    page_closed: bool,
}

impl ChangeFeed {
    /// Builds a feed from a tab's storage subscription and page subscription.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        storage: StorageEvents,
        page: broadcast::Receiver<PageEvent>,
    ) -> Self {
        Self {
            key: key.into(),
            storage,
            page,
            storage_closed: false,
            page_closed: false,
        }
    }

    /// Storage key this feed watches
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for the next reason to reload. Returns `None` once every source is closed.
    pub async fn next(&mut self) -> Option<ReloadCause> {
        loop {
            tokio::select! {
                event = self.storage.recv(), if !self.storage_closed => match event {
                    Ok(event) => {
                        if let Some(cause) = self.classify_storage(&event) {
                            return Some(cause);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Storage listener lagged, {} events skipped", skipped);
                        return Some(ReloadCause::StorageChanged);
                    }
                    Err(RecvError::Closed) => self.storage_closed = true,
                },
                event = self.page.recv(), if !self.page_closed => match event {
                    Ok(event) => {
                        if let Some(cause) = Self::classify_page(&event) {
                            return Some(cause);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Page listener lagged, {} events skipped", skipped);
                        return Some(ReloadCause::LocalUpdate);
                    }
                    Err(RecvError::Closed) => self.page_closed = true,
                },
                else => return None,
            }
        }
    }

    fn classify_storage(&self, event: &StorageEvent) -> Option<ReloadCause> {
        if event.key == self.key {
            debug!("Storage event for {:?} from {}", event.key, event.source);
            Some(ReloadCause::StorageChanged)
        } else {
            None
        }
    }

    fn classify_page(event: &PageEvent) -> Option<ReloadCause> {
        match event {
            PageEvent::Custom(name) if name == DONATIONS_UPDATED => Some(ReloadCause::LocalUpdate),
            PageEvent::VisibilityChanged(Visibility::Visible) => Some(ReloadCause::BecameVisible),
            PageEvent::Custom(_) | PageEvent::VisibilityChanged(Visibility::Hidden) => None,
        }
    }
}
