//! Origin-scoped key/value storage.
//!
//! A [`LocalStorage`] handle belongs to one tab. All handles of the same origin read and
//! write the same rows of the `storage_items` table, and every write that changes a value
//! is announced on the origin's broadcast channel as a [`StorageEvent`]. Like a browser,
//! a tab never receives the events caused by its own writes; [`StorageEvents`] filters
//! them out.

use crate::{
    entities::{StorageItem, storage_item},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, entity::prelude::*};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// Identifies one tab (browsing context) within an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Notification that a stored value changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key whose value changed
    pub key: String,
    /// Value before the write, `None` if the key was absent
    pub old_value: Option<String>,
    /// Value after the write
    pub new_value: Option<String>,
    /// Tab that performed the write
    pub source: TabId,
}

/// A tab's handle on the origin's persistent storage.
#[derive(Clone)]
pub struct LocalStorage {
    origin: String,
    tab: TabId,
    db: DatabaseConnection,
    events: broadcast::Sender<StorageEvent>,
}

impl LocalStorage {
    pub(crate) const fn new(
        origin: String,
        tab: TabId,
        db: DatabaseConnection,
        events: broadcast::Sender<StorageEvent>,
    ) -> Self {
        Self {
            origin,
            tab,
            db,
            events,
        }
    }

    /// Origin this handle is scoped to
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Tab that owns this handle
    #[must_use]
    pub const fn tab(&self) -> TabId {
        self.tab
    }

    /// Reads the value stored under `key`, or `None` if the key is absent.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let item = StorageItem::find()
            .filter(storage_item::Column::Origin.eq(self.origin.as_str()))
            .filter(storage_item::Column::Key.eq(key))
            .one(&self.db)
            .await?;
        Ok(item.map(|item| item.value))
    }

    /// Replaces the value stored under `key`.
    ///
    /// Other tabs of the origin receive a [`StorageEvent`] when the value actually changed.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let existing = StorageItem::find()
            .filter(storage_item::Column::Origin.eq(self.origin.as_str()))
            .filter(storage_item::Column::Key.eq(key))
            .one(&txn)
            .await?;

        let old_value = if let Some(item) = existing {
            let old_value = item.value.clone();
            if old_value == value {
                txn.commit().await?;
                return Ok(());
            }
            let mut active_model: storage_item::ActiveModel = item.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
            Some(old_value)
        } else {
            let new_item = storage_item::ActiveModel {
                origin: Set(self.origin.clone()),
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
                ..Default::default()
            };
            new_item.insert(&txn).await?;
            None
        };

        txn.commit().await?;

        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value: Some(value.to_string()),
            source: self.tab,
        };
        // No receivers just means no other tab is open.
        let delivered = self.events.send(event).unwrap_or(0);
        debug!(
            "{} wrote key {:?} on origin {:?}; storage event reached {} receivers",
            self.tab, key, self.origin, delivered
        );
        Ok(())
    }

    /// Subscribes to writes made by the other tabs of this origin.
    #[must_use]
    pub fn subscribe(&self) -> StorageEvents {
        StorageEvents::from_receiver(self.tab, self.events.subscribe())
    }
}

/// Receiver for storage events caused by other tabs.
pub struct StorageEvents {
    tab: TabId,
    receiver: broadcast::Receiver<StorageEvent>,
}

impl StorageEvents {
    pub(crate) const fn from_receiver(
        tab: TabId,
        receiver: broadcast::Receiver<StorageEvent>,
    ) -> Self {
        Self { tab, receiver }
    }

    /// Waits for the next event from another tab.
    ///
    /// Lagging and channel closure are reported as the underlying broadcast errors.
    pub async fn recv(&mut self) -> std::result::Result<StorageEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if event.source != self.tab {
                return Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_get_item_absent_key() -> Result<()> {
        let origin = setup_test_origin().await?;
        let tab = origin.open_tab();
        assert_eq!(tab.storage().get_item("donations").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_item_replaces_value() -> Result<()> {
        let origin = setup_test_origin().await?;
        let tab = origin.open_tab();
        let storage = tab.storage();

        storage.set_item("donations", "[]").await?;
        storage.set_item("donations", "[1]").await?;
        assert_eq!(storage.get_item("donations").await?.as_deref(), Some("[1]"));

        let rows = StorageItem::find().all(origin.database()).await?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_origins_do_not_share_keys() -> Result<()> {
        let db = setup_test_db().await?;
        let left = crate::core::origin::Origin::new("left", db.clone());
        let right = crate::core::origin::Origin::new("right", db);

        left.open_tab().storage().set_item("donations", "left").await?;
        assert_eq!(right.open_tab().storage().get_item("donations").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_event_reaches_other_tabs_only() -> Result<()> {
        let origin = setup_test_origin().await?;
        let writer = origin.open_tab();
        let reader = origin.open_tab();
        let mut writer_events = writer.storage().subscribe();
        let mut reader_events = reader.storage().subscribe();

        writer.storage().set_item("donations", "[]").await?;

        let event = timeout(Duration::from_secs(1), reader_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.key, "donations");
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("[]"));
        assert_eq!(event.source, writer.id());

        let own = timeout(Duration::from_millis(50), writer_events.recv()).await;
        assert!(own.is_err(), "writer must not observe its own write");
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_value_emits_no_event() -> Result<()> {
        let origin = setup_test_origin().await?;
        let writer = origin.open_tab();
        let reader = origin.open_tab();

        writer.storage().set_item("donations", "[]").await?;
        let mut reader_events = reader.storage().subscribe();
        writer.storage().set_item("donations", "[]").await?;

        let next = timeout(Duration::from_millis(50), reader_events.recv()).await;
        assert!(next.is_err());
        Ok(())
    }
}
