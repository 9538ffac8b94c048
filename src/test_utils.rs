//! Shared test utilities for the donation tally.
//!
//! This module provides helpers for setting up in-memory databases, origins and tabs,
//! and for building donation records with sensible defaults.

use crate::{
    core::{
        donation::DonationRecord,
        origin::{Origin, Tab},
        store::{DONATIONS_KEY, encode_collection},
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an origin named `"test"` over a fresh in-memory database.
pub async fn setup_test_origin() -> Result<Origin> {
    let db = setup_test_db().await?;
    Ok(Origin::new("test", db))
}

/// Sets up an origin with one open tab.
/// Returns (origin, tab) for common test scenarios.
pub async fn setup_with_tab() -> Result<(Origin, Tab)> {
    let origin = setup_test_origin().await?;
    let tab = origin.open_tab();
    Ok((origin, tab))
}

/// Builds a record with sensible defaults.
///
/// # Defaults
/// * `message`: None
/// * `timestamp`: the id read as Unix milliseconds, or 2024-01-01T08:00:00Z when the
///   id is not numeric
pub fn sample_record(id: &str, amount: u64, donor: &str) -> DonationRecord {
    DonationRecord {
        id: id.to_string(),
        amount,
        donor: donor.to_string(),
        message: None,
        timestamp: timestamp_for(id),
    }
}

fn timestamp_for(id: &str) -> DateTime<Utc> {
    id.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .or_else(|| DateTime::from_timestamp_millis(1_704_096_000_000))
        .unwrap_or_default()
}

/// Writes `records` straight to a tab's storage under the default key.
///
/// Only the storage event is produced; no page event is dispatched.
pub async fn seed_donations(tab: &Tab, records: &[DonationRecord]) -> Result<()> {
    let blob = encode_collection(records)?;
    tab.storage().set_item(DONATIONS_KEY, &blob).await
}
