//! Origins and tabs.
//!
//! An [`Origin`] is the unit of shared persistent state: every [`Tab`] opened from it sees
//! the same storage and receives the storage events of its sibling tabs. A tab also owns
//! its page event target, which carries same-document custom events and visibility
//! transitions.

use crate::core::{
    notify::{ChangeFeed, PageEvents},
    storage::{LocalStorage, StorageEvent, TabId},
    store::DonationStore,
};
use sea_orm::DatabaseConnection;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::broadcast;
use tracing::debug;

const STORAGE_EVENT_CAPACITY: usize = 64;

/// Persistent storage shared by a set of tabs.
#[derive(Clone)]
pub struct Origin {
    name: String,
    db: DatabaseConnection,
    storage_events: broadcast::Sender<StorageEvent>,
    next_tab: Arc<AtomicU64>,
}

impl Origin {
    /// Creates an origin backed by `db`. Tables must already exist.
    #[must_use]
    pub fn new(name: impl Into<String>, db: DatabaseConnection) -> Self {
        let (storage_events, _) = broadcast::channel(STORAGE_EVENT_CAPACITY);
        Self {
            name: name.into(),
            db,
            storage_events,
            next_tab: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Origin name used to scope storage rows
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying database connection
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Opens a new tab with a fresh id and its own page event target.
    #[must_use]
    pub fn open_tab(&self) -> Tab {
        let id = TabId(self.next_tab.fetch_add(1, Ordering::Relaxed));
        debug!("Opened {} on origin {:?}", id, self.name);
        Tab {
            id,
            storage: LocalStorage::new(
                self.name.clone(),
                id,
                self.db.clone(),
                self.storage_events.clone(),
            ),
            page: PageEvents::new(),
        }
    }
}

/// One browsing context of an origin.
#[derive(Clone)]
pub struct Tab {
    id: TabId,
    storage: LocalStorage,
    page: PageEvents,
}

impl Tab {
    /// Tab identifier, unique within the origin
    #[must_use]
    pub const fn id(&self) -> TabId {
        self.id
    }

    /// Storage handle scoped to this tab
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Page event target of this tab
    #[must_use]
    pub const fn page(&self) -> &PageEvents {
        &self.page
    }

    /// Store accessor for the donation collection under `key`
    #[must_use]
    pub fn donation_store(&self, key: &str) -> DonationStore {
        DonationStore::with_key(self.storage.clone(), key)
    }

    /// Subscribes to every signal that may mean the collection under `key` changed.
    #[must_use]
    pub fn change_feed(&self, key: &str) -> ChangeFeed {
        ChangeFeed::new(key, self.storage.subscribe(), self.page.subscribe())
    }
}
