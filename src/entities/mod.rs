//! Entity module - Contains the SeaORM entity definitions for the database.
//! The only table is the per-origin key/value storage that backs every tab.

/// Key/value rows of every origin's storage
pub mod storage_item;

pub use storage_item::{Entity as StorageItem, Model as StorageItemModel};
