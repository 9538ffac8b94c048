//! Core logic - framework-agnostic storage, synchronization and tally operations.
//!
//! Data flows one way: the mutation view writes through the store accessor, the write
//! is signalled on the notification channel, and the display view reloads through the
//! store accessor.

/// Animated counter state machine and board
pub mod counter;
/// Display view with its cached collection
pub mod display;
/// Donation records and input validation
pub mod donation;
/// Number formatting helpers
pub mod format;
/// Mutation view (add and delete donations)
pub mod mutation;
/// Unified change notifications
pub mod notify;
/// Origins and tabs
pub mod origin;
/// Origin-scoped key/value storage
pub mod storage;
/// Store accessor for the donation collection
pub mod store;
/// Derived aggregates
pub mod totals;
