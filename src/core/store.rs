//! Store accessor for the donation collection.
//!
//! The whole collection lives in one JSON blob under a well-known storage key. Every save
//! replaces the blob, so concurrent writers in different tabs resolve to "last full write
//! wins"; nothing is merged. A blob that cannot be decoded is logged and read as an empty
//! collection so a corrupt value never takes a view down.

use crate::{
    core::{donation::DonationRecord, storage::LocalStorage},
    errors::Result,
};
use std::future::Future;
use tracing::{error, info};

/// Storage key used when none is configured
pub const DONATIONS_KEY: &str = "donations";

/// Read/write access to the persisted donation collection.
///
/// Views receive an implementation instead of reaching for storage directly.
pub trait DonationRepository: Send + Sync {
    /// Reads the full collection. An absent or unreadable blob yields an empty collection.
    fn load(&self) -> impl Future<Output = Result<Vec<DonationRecord>>> + Send;

    /// Replaces the full collection.
    fn save(&self, records: &[DonationRecord]) -> impl Future<Output = Result<()>> + Send;
}

/// [`DonationRepository`] backed by a tab's [`LocalStorage`].
#[derive(Clone)]
pub struct DonationStore {
    storage: LocalStorage,
    key: String,
}

impl DonationStore {
    /// Accessor for the default `"donations"` key
    #[must_use]
    pub fn new(storage: LocalStorage) -> Self {
        Self::with_key(storage, DONATIONS_KEY)
    }

    /// Accessor for a custom key
    #[must_use]
    pub fn with_key(storage: LocalStorage, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    /// Storage key holding the collection
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl DonationRepository for DonationStore {
    async fn load(&self) -> Result<Vec<DonationRecord>> {
        let Some(blob) = self.storage.get_item(&self.key).await? else {
            return Ok(Vec::new());
        };

        match decode_collection(&blob) {
            Ok(records) => Ok(records),
            Err(e) => {
                error!(
                    "Error loading donations from {:?} ({}): {}",
                    self.key,
                    self.storage.tab(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, records: &[DonationRecord]) -> Result<()> {
        let blob = encode_collection(records)?;
        self.storage.set_item(&self.key, &blob).await?;
        info!(
            "Saved {} donations under {:?} ({})",
            records.len(),
            self.key,
            self.storage.tab()
        );
        Ok(())
    }
}

/// Serializes a collection to its stored JSON form.
pub fn encode_collection(records: &[DonationRecord]) -> serde_json::Result<String> {
    serde_json::to_string(records)
}

/// Parses a stored JSON blob.
pub fn decode_collection(blob: &str) -> serde_json::Result<Vec<DonationRecord>> {
    serde_json::from_str(blob)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_load_absent_key_is_empty() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let store = DonationStore::new(tab.storage().clone());
        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let store = tab.donation_store(DONATIONS_KEY);

        let mut first = sample_record("1704096000000", 50_000, "Alice");
        first.message = Some("Semangat!".to_string());
        let second = sample_record("1704096000001", 125_000, "Budi");
        let records = vec![first, second];

        store.save(&records).await?;
        assert_eq!(store.load().await?, records);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_replaces_previous_collection() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let store = tab.donation_store(DONATIONS_KEY);

        store
            .save(&[
                sample_record("1", 10, "Alice"),
                sample_record("2", 20, "Bob"),
            ])
            .await?;
        store.save(&[sample_record("3", 30, "Citra")]).await?;

        let loaded = store.load().await?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "3");
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_blob_loads_as_empty() -> Result<()> {
        init_test_tracing();
        let (_origin, tab) = setup_with_tab().await?;
        tab.storage().set_item(DONATIONS_KEY, "{not json").await?;

        let store = tab.donation_store(DONATIONS_KEY);
        assert!(store.load().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_loads_blob_written_by_a_browser() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let blob = r#"[{"id":"1704096000000","amount":50000,"donor":"Alice","message":"","timestamp":"2024-01-01T08:00:00.000Z"}]"#;
        tab.storage().set_item(DONATIONS_KEY, blob).await?;

        let loaded = tab.donation_store(DONATIONS_KEY).load().await?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].amount, 50_000);
        assert_eq!(loaded[0].message, None);
        assert_eq!(
            loaded[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_key_is_isolated() -> Result<()> {
        let (_origin, tab) = setup_with_tab().await?;
        let default_store = tab.donation_store(DONATIONS_KEY);
        let other_store = tab.donation_store("donations-2025");

        other_store.save(&[sample_record("1", 10, "Alice")]).await?;
        assert_eq!(other_store.key(), "donations-2025");
        assert!(default_store.load().await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_encode_empty_collection() {
        assert_eq!(encode_collection(&[]).unwrap(), "[]");
        assert!(decode_collection("[]").unwrap().is_empty());
    }
}
