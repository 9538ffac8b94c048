//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Donation entry, listing and deletion commands
pub mod donation;

/// General utility commands
pub mod general;

/// Live tally board command
pub mod tally;

// Export commands
pub use donation::*;
pub use general::*;
pub use tally::*;
