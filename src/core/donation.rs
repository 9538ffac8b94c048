//! Donation records and input validation.
//!
//! A [`DonationRecord`] is one persisted contribution. New records are built from raw form
//! input by [`NewDonation::parse`], which applies the same rules the form enforces: the
//! amount keeps only its digits and must be positive, the donor must be non-empty after
//! trimming, and the optional message is bounded in length.

use crate::errors::{Error, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One persisted contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    /// Unique identifier, the creation time in Unix milliseconds
    pub id: String,
    /// Amount in the smallest currency unit
    pub amount: u64,
    /// Name of the person or organization donating
    pub donor: String,
    /// Optional note from the donor
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_message"
    )]
    pub message: Option<String>,
    /// When the donation was recorded
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Validated form input, ready to become a [`DonationRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDonation {
    /// Parsed amount, always positive
    pub amount: u64,
    /// Trimmed donor name, never empty
    pub donor: String,
    /// Trimmed message, `None` when blank
    pub message: Option<String>,
}

impl NewDonation {
    /// Validates raw form input.
    ///
    /// # Errors
    /// * [`Error::InvalidAmount`] - no digits, zero, or too large
    /// * [`Error::MissingDonor`] - donor is blank
    /// * [`Error::MessageTooLong`] - message exceeds `max_message_len` characters
    pub fn parse(
        amount_text: &str,
        donor: &str,
        message: Option<&str>,
        max_message_len: usize,
    ) -> Result<Self> {
        let amount = parse_amount(amount_text)?;

        let donor = donor.trim();
        if donor.is_empty() {
            return Err(Error::MissingDonor);
        }

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        if let Some(message) = message {
            let length = message.chars().count();
            if length > max_message_len {
                return Err(Error::MessageTooLong {
                    length,
                    max: max_message_len,
                });
            }
        }

        Ok(Self {
            amount,
            donor: donor.to_string(),
            message: message.map(ToString::to_string),
        })
    }

    /// Turns validated input into a record whose id is unique within `existing`.
    #[must_use]
    pub fn into_record(self, now: DateTime<Utc>, existing: &[DonationRecord]) -> DonationRecord {
        let timestamp = now.trunc_subsecs(3);
        DonationRecord {
            id: next_donation_id(timestamp, existing),
            amount: self.amount,
            donor: self.donor,
            message: self.message,
            timestamp,
        }
    }
}

/// Extracts the digits of `text` as an amount.
///
/// Separators and currency symbols are ignored, so `"Rp 50.000"` parses as `50000`.
pub fn parse_amount(text: &str) -> Result<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(Error::InvalidAmount {
            input: text.to_string(),
        }),
    }
}

/// Generates an identifier from the creation time, bumped past any id already in use.
#[must_use]
pub fn next_donation_id(now: DateTime<Utc>, existing: &[DonationRecord]) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !existing.iter().any(|record| record.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

fn non_empty_message<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let message = Option::<String>::deserialize(deserializer)?;
    Ok(message.filter(|m| !m.is_empty()))
}

/// Millisecond RFC 3339 timestamps, e.g. `2024-01-01T08:30:00.123Z`.
mod timestamp_millis {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        match DateTime::parse_from_rfc3339(&text) {
            Ok(timestamp) => Ok(timestamp.with_timezone(&Utc)),
            // Without an offset the time is read as UTC
            Err(error) => NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| D::Error::custom(error)),
        }
    }
}
