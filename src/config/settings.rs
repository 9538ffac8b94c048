//! Tally settings loading from tally.toml
//!
//! Every field has a default, so an absent file or a file that only sets a few keys is
//! valid. The path can be overridden with the `TALLY_CONFIG` environment variable.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default settings file, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "tally.toml";

/// Configuration structure representing the entire tally.toml file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the storage origin shared by all tabs
    pub origin: String,
    /// Storage key holding the serialized donation collection
    pub storage_key: String,
    /// Goal and form limits
    pub tally: TallySettings,
    /// Counter animation timing
    pub counter: CounterSettings,
    /// Discord presentation knobs
    pub discord: DiscordSettings,
}

/// Goal and form limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TallySettings {
    /// Fundraising goal in the smallest currency unit
    pub monthly_goal: u64,
    /// Maximum length of a donor message, in characters
    pub max_message_len: usize,
}

/// Counter animation timing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CounterSettings {
    /// Total animation time in milliseconds
    pub duration_ms: u64,
    /// Number of discrete frames per animation
    pub steps: u32,
    /// Fraction of the counter that must be visible before it animates
    pub visibility_threshold: f64,
}

/// Discord presentation knobs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Only every n-th animation frame is pushed as a message edit
    pub edit_stride: u32,
    /// How long a delete confirmation waits for a button press
    pub confirm_timeout_secs: u64,
    /// How long a `/tally` board keeps following reloads
    pub live_board_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            origin: "local".to_string(),
            storage_key: crate::core::store::DONATIONS_KEY.to_string(),
            tally: TallySettings::default(),
            counter: CounterSettings::default(),
            discord: DiscordSettings::default(),
        }
    }
}

impl Default for TallySettings {
    fn default() -> Self {
        Self {
            monthly_goal: 50_000_000,
            max_message_len: 200,
        }
    }
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            steps: 60,
            visibility_threshold: 0.5,
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            edit_stride: 12,
            confirm_timeout_secs: 60,
            live_board_secs: 300,
        }
    }
}

impl CounterSettings {
    /// Total animation duration
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl DiscordSettings {
    /// Button confirmation window
    #[must_use]
    pub const fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    /// Lifetime of a live board message
    #[must_use]
    pub const fn live_board(&self) -> Duration {
        Duration::from_secs(self.live_board_secs)
    }
}

impl Settings {
    /// Rejects settings that would make the views misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(config_error("storage_key must not be empty"));
        }
        if self.counter.steps == 0 {
            return Err(config_error("counter.steps must be greater than zero"));
        }
        if self.counter.duration_ms == 0 {
            return Err(config_error("counter.duration_ms must be greater than zero"));
        }
        if self.counter.duration_ms < u64::from(self.counter.steps) {
            return Err(config_error(
                "counter.duration_ms must allow at least 1ms per step",
            ));
        }
        let threshold = self.counter.visibility_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(config_error(
                "counter.visibility_threshold must be in (0, 1]",
            ));
        }
        if self.discord.edit_stride == 0 {
            return Err(config_error("discord.edit_stride must be greater than zero"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> Error {
    Error::Config {
        message: message.to_string(),
    }
}

/// Parses settings from TOML text and validates them.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from a TOML file
///
/// # Returns
/// * `Ok(Settings)` - Parsed settings, or the defaults when the file does not exist
/// * `Err(Error)` - The file exists but cannot be read, parsed or validated
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(Error::Config {
                message: format!("Failed to read settings file {}: {e}", path.display()),
            });
        }
    };

    let settings = parse_settings(&contents)?;
    tracing::info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Loads settings from `TALLY_CONFIG` or the default location (./tally.toml)
pub fn load_default_settings() -> Result<Settings> {
    let path =
        std::env::var("TALLY_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    load_settings(path)
}
