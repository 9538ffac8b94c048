//! Storage item entity - One key/value pair of an origin's persistent storage.
//!
//! Every origin owns an independent key space. Values are opaque strings; the donation
//! collection is stored as a single JSON blob under one well-known key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Origin the item belongs to (e.g., `"local"`)
    pub origin: String,
    /// Storage key (e.g., `"donations"`)
    pub key: String,
    /// Stored value, replaced wholesale on every write
    pub value: String,
    /// When the value was last written
    pub updated_at: DateTime,
}

/// `StorageItem` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
