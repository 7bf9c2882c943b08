//! Hash record definitions.

use chrono::{DateTime, Local, NaiveDateTime, SubsecRound, Utc};
use std::time::SystemTime;

use crate::scanner::HashedFile;

/// Text layout of every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Session tag used when none is given.
pub const DEFAULT_SESSION: i64 = 1;

/// One tracked file in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    /// Absolute, normalized path; unique key
    pub path: String,
    /// Lowercase hex SHA-256 of the file content
    pub content_hash: String,
    /// File size at hash time
    pub size_bytes: u64,
    /// Filesystem creation time at hash time (local)
    pub created_at: NaiveDateTime,
    /// Filesystem modification time at hash time (local)
    pub modified_at: NaiveDateTime,
    /// Wall-clock time the record was written
    pub observed_at: DateTime<Utc>,
    /// Run/batch that produced or last updated the record
    pub session_id: i64,
}

impl HashRecord {
    /// Build a fresh record from a hashing result, stamped with the current time.
    ///
    /// Times are truncated to the microsecond precision of the stored
    /// columns, so the record equals what a later read returns.
    #[must_use]
    pub fn from_hashed(path: impl Into<String>, hashed: &HashedFile, session_id: i64) -> Self {
        Self {
            path: path.into(),
            content_hash: hashed.hex(),
            size_bytes: hashed.size,
            created_at: local_naive(hashed.created),
            modified_at: local_naive(hashed.modified),
            observed_at: Utc::now().trunc_subsecs(6),
            session_id,
        }
    }
}

/// Whether `digest` is a well-formed 256-bit hex digest.
#[must_use]
pub fn is_valid_digest(digest: &str) -> bool {
    digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit())
}

fn local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local().trunc_subsecs(6)
}

/// Render a timestamp column value.
#[must_use]
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp column value.
///
/// Accepts values with or without a fractional part. Missing or
/// unreadable values (rows written by older tools) map to the Unix epoch.
#[must_use]
pub fn parse_timestamp(value: Option<&str>) -> NaiveDateTime {
    value
        .and_then(|v| NaiveDateTime::parse_from_str(v.trim(), "%Y-%m-%d %H:%M:%S%.f").ok())
        .unwrap_or_else(|| {
            log::trace!("Unreadable timestamp {:?}, using epoch", value);
            DateTime::<Utc>::UNIX_EPOCH.naive_utc()
        })
}
