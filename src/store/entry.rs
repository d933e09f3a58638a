//! Entry Module
//!
//! Defines a stored payload, its date metadata, and the JSON envelope every
//! backend persists.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// == Entry Metadata ==
/// Creation and last-access dates of an entry.
///
/// Either field may be missing when a record was written by something else
/// or is corrupt; the sweep treats an entry with neither as expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    /// Instant the entry was uploaded
    pub created: Option<DateTime<Utc>>,
    /// Calendar day (UTC) the entry was last downloaded
    pub last_accessed_date: Option<NaiveDate>,
}

impl EntryMetadata {
    /// Stamps both dates from `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created: Some(now),
            last_accessed_date: Some(now.date_naive()),
        }
    }

    /// Returns true if the entry was already accessed on `today`.
    pub fn is_accessed_on(&self, today: NaiveDate) -> bool {
        self.last_accessed_date == Some(today)
    }

    /// Returns a copy with the last-access date moved to `now`'s day.
    ///
    /// `created` is preserved; if it was lost, `now` stands in for it.
    pub fn refreshed(&self, now: DateTime<Utc>) -> Self {
        Self {
            created: self.created.or(Some(now)),
            last_accessed_date: Some(now.date_naive()),
        }
    }
}

// == Entry ==
/// One stored JSON payload plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Raw JSON text exactly as uploaded
    pub content: String,
    /// Date bookkeeping
    pub metadata: EntryMetadata,
}

impl Entry {
    /// Creates a new entry stamped at `now`.
    pub fn new(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            metadata: EntryMetadata::new(now),
        }
    }
}

/// An entry id together with its metadata, as returned by listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub id: String,
    pub metadata: EntryMetadata,
}

// == Envelope Codec ==
#[derive(Serialize)]
struct EnvelopeOut<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_accessed_date: Option<String>,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    content: String,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    last_accessed_date: Option<String>,
}

/// Serializes an entry into its persisted JSON envelope.
pub fn encode_envelope(entry: &Entry) -> serde_json::Result<Vec<u8>> {
    let envelope = EnvelopeOut {
        content: &entry.content,
        created: entry
            .metadata
            .created
            .map(|c| c.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        last_accessed_date: entry
            .metadata
            .last_accessed_date
            .map(|d| d.format("%Y-%m-%d").to_string()),
    };
    serde_json::to_vec(&envelope)
}

/// Parses a persisted envelope.
///
/// Returns `None` when the record is not a usable envelope. Date fields that
/// are present but unparseable decode as missing.
pub fn decode_envelope(raw: &[u8]) -> Option<Entry> {
    let envelope: EnvelopeIn = serde_json::from_slice(raw).ok()?;
    Some(Entry {
        content: envelope.content,
        metadata: EntryMetadata {
            created: envelope.created.as_deref().and_then(parse_created),
            last_accessed_date: envelope
                .last_accessed_date
                .as_deref()
                .and_then(parse_date),
        },
    })
}

/// Decodes only the metadata of a record; corrupt records yield empty metadata.
pub fn decode_metadata(raw: &[u8]) -> EntryMetadata {
    decode_envelope(raw)
        .map(|entry| entry.metadata)
        .unwrap_or_default()
}

fn parse_created(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
