/// Database configuration and connection management
pub mod database;

/// Tally settings loaded from tally.toml
pub mod settings;
