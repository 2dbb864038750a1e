//! Versioned snapshot codec for the reading-state store.
//!
//! # Responsibility
//! - Encode the store contents into a versioned envelope.
//! - Structurally validate and migrate persisted payloads on hydration.
//!
//! # Invariants
//! - Envelope shape is `{"state": {"books": [..], "highlights": [..]}, "version": N}`.
//! - A bare `{"books": .., "highlights": ..}` object is accepted as version 0.
//! - Version 0 (or absent) migrates as-is, defaulting missing arrays to `[]`.
//! - Present-but-non-array fields, unknown versions and undecodable records
//!   are rejected; the store then falls back to an empty state.

use crate::store::ReadingState;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version tag written with every snapshot.
pub const SNAPSHOT_VERSION: u32 = 0;

/// Storage key used when the caller does not configure one.
pub const DEFAULT_SNAPSHOT_KEY: &str = "book-storage";

const BOOKS_FIELD: &str = "books";
const HIGHLIGHTS_FIELD: &str = "highlights";

/// Reasons a persisted payload cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotDecodeError {
    Malformed(String),
    NotAnObject,
    UnsupportedVersion { found: u64, supported: u32 },
    FieldNotArray(&'static str),
    InvalidRecord { field: &'static str, message: String },
}

impl Display for SnapshotDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "snapshot is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "snapshot must be a JSON object"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "snapshot version {found} is newer than supported {supported}"
            ),
            Self::FieldNotArray(field) => write!(f, "snapshot field `{field}` must be an array"),
            Self::InvalidRecord { field, message } => {
                write!(f, "snapshot field `{field}` has an invalid record: {message}")
            }
        }
    }
}

impl Error for SnapshotDecodeError {}

#[derive(Serialize)]
struct SnapshotEnvelope<'a> {
    state: &'a ReadingState,
    version: u32,
}

/// Serializes `state` into the current envelope.
pub fn encode_snapshot(state: &ReadingState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SnapshotEnvelope {
        state,
        version: SNAPSHOT_VERSION,
    })
}

/// Validates, migrates and decodes a persisted payload.
pub fn decode_snapshot(raw: &str) -> Result<ReadingState, SnapshotDecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| SnapshotDecodeError::Malformed(err.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(SnapshotDecodeError::NotAnObject);
    };

    let (version, state) = match envelope.remove("state") {
        Some(Value::Object(state)) => (read_version(&envelope)?, state),
        Some(_) => return Err(SnapshotDecodeError::NotAnObject),
        None => (read_version(&envelope)?, envelope),
    };

    let state = migrate(version, state)?;
    Ok(ReadingState {
        books: decode_records(&state, BOOKS_FIELD)?,
        highlights: decode_records(&state, HIGHLIGHTS_FIELD)?,
    })
}

fn read_version(envelope: &Map<String, Value>) -> Result<u64, SnapshotDecodeError> {
    match envelope.get("version") {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_u64().ok_or_else(|| {
            SnapshotDecodeError::Malformed(format!("version must be a non-negative integer, got {value}"))
        }),
    }
}

/// Brings a state object from `version` to [`SNAPSHOT_VERSION`].
fn migrate(version: u64, mut state: Map<String, Value>) -> Result<Map<String, Value>, SnapshotDecodeError> {
    if version > u64::from(SNAPSHOT_VERSION) {
        return Err(SnapshotDecodeError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    // v0: pass-through with empty defaults.
    for field in [BOOKS_FIELD, HIGHLIGHTS_FIELD] {
        state
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
    }
    Ok(state)
}

fn decode_records<T: serde::de::DeserializeOwned>(
    state: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<T>, SnapshotDecodeError> {
    match state.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                T::deserialize(item).map_err(|err| SnapshotDecodeError::InvalidRecord {
                    field,
                    message: err.to_string(),
                })
            })
            .collect(),
        None => Ok(Vec::new()),
        Some(_) => Err(SnapshotDecodeError::FieldNotArray(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_snapshot, encode_snapshot, SnapshotDecodeError};
    use crate::model::book::Book;
    use crate::store::ReadingState;

    #[test]
    fn non_array_books_are_rejected() {
        let err = decode_snapshot(r#"{"books": "not-an-array", "highlights": []}"#).unwrap_err();
        assert_eq!(err, SnapshotDecodeError::FieldNotArray("books"));
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let state = decode_snapshot(r#"{"state": {}, "version": 0}"#).unwrap();
        assert_eq!(state, ReadingState::default());
    }

    #[test]
    fn newer_versions_are_rejected() {
        let err = decode_snapshot(r#"{"state": {"books": [], "highlights": []}, "version": 7}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotDecodeError::UnsupportedVersion { found: 7, .. }
        ));
    }

    #[test]
    fn encoded_envelope_carries_version_tag() {
        let state = ReadingState {
            books: vec![Book::new("Dune", "Frank Herbert", 412)],
            highlights: Vec::new(),
        };
        let raw = encode_snapshot(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["books"][0]["totalPages"], 412);
        assert_eq!(decode_snapshot(&raw).unwrap(), state);
    }
}
