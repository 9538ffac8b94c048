//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not commands
//! themselves: autocomplete suggestions and button confirmations.

/// Autocomplete handlers for donation ids
pub mod autocomplete;
/// Button prompt used to confirm deletions
pub mod confirm;
