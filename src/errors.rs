//! Unified error type for the donation tally.
//!
//! Validation failures (bad amount, missing donor, oversized message) live next to
//! storage and framework errors so the core can return a single `Result`. The bot layer
//! uses [`Error::is_user_facing`] to decide whether an error becomes a reply or goes to
//! the framework error handler.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be read, parsed or validated
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description of the problem
        message: String,
    },

    /// Persistent storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A collection could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The amount field did not contain a positive whole number
    #[error("Invalid amount: {input:?}")]
    InvalidAmount {
        /// The raw text the user entered
        input: String,
    },

    /// The donor field was empty after trimming
    #[error("Donor name is required")]
    MissingDonor,

    /// The optional message exceeded the configured limit
    #[error("Message is too long: {length} characters (max {max})")]
    MessageTooLong {
        /// Length of the submitted message in characters
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// I/O failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Discord error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Returns true for errors caused by form input rather than the system.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. } | Self::MissingDonor | Self::MessageTooLong { .. }
        )
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_user_facing() {
        assert!(
            Error::InvalidAmount {
                input: "abc".to_string()
            }
            .is_user_facing()
        );
        assert!(Error::MissingDonor.is_user_facing());
        assert!(Error::MessageTooLong { length: 201, max: 200 }.is_user_facing());
        assert!(
            !Error::Config {
                message: "bad".to_string()
            }
            .is_user_facing()
        );
    }
}
