//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use std::str::FromStr;

use mf_core::{AttemptId, Classification, JobId, StreamDescriptor};
use uuid::Uuid;

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

// ---------------------------------------------------------------------------
// AttemptStatus
// ---------------------------------------------------------------------------

/// Terminal and in-flight states of a conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptStatus {
    /// Attempt is in flight; the only non-terminal state.
    Converting,
    /// Verified output was published.
    Done,
    /// The external transcoder failed.
    Error,
    /// The run was cancelled or died while this attempt was in flight.
    Interrupted,
    /// An integrity check or the publish step failed.
    CheckFailed,
}

impl AttemptStatus {
    /// Stable string form used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converting => "converting",
            Self::Done => "done",
            Self::Error => "error",
            Self::Interrupted => "interrupted",
            Self::CheckFailed => "check_failed",
        }
    }

    /// Whether this status ends an attempt.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Converting)
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = mf_core::Error;

    fn from_str(s: &str) -> mf_core::Result<Self> {
        match s {
            "converting" => Ok(Self::Converting),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            "interrupted" => Ok(Self::Interrupted),
            "check_failed" => Ok(Self::CheckFailed),
            other => Err(mf_core::Error::Validation(format!(
                "unknown attempt status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One managed media file and its conversion status.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Current filesystem location; replaced on successful publish.
    pub path: String,
    /// Film or series; immutable after creation.
    pub classification: Classification,
    /// True once a verified output has been published (or the source was
    /// quarantined).
    pub converted: bool,
    /// Last-known stream count of the file at `path`.
    pub stream_count: u32,
    /// Last-known size in bytes.
    pub size_bytes: u64,
    /// Last-known overall bit rate.
    pub bit_rate: Option<u64>,
    /// Stream snapshot in probe order; wholesale replaced on re-probe.
    pub streams: Vec<StreamDescriptor>,
    pub created_at: String,
    pub updated_at: String,
}

impl Job {
    /// Column list matching [`Job::from_row`].
    pub const COLS: &'static str = "id, path, classification, converted, stream_count, \
         size_bytes, bit_rate, streams, created_at, updated_at";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let classification_raw: String = row.get(2)?;
        let classification = Classification::from_str(&classification_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let streams_json: String = row.get(7)?;
        let streams: Vec<StreamDescriptor> =
            serde_json::from_str(&streams_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Self {
            id: parse_id(row, 0)?,
            path: row.get(1)?,
            classification,
            converted: row.get::<_, i64>(3)? != 0,
            stream_count: row.get::<_, i64>(4)? as u32,
            size_bytes: row.get::<_, i64>(5)? as u64,
            bit_rate: row.get::<_, Option<i64>>(6)?.map(|b| b as u64),
            streams,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ConversionAttempt
// ---------------------------------------------------------------------------

/// One pre-check/convert/post-check cycle for a job. Append-only.
#[derive(Debug, Clone)]
pub struct ConversionAttempt {
    pub id: AttemptId,
    pub job_id: JobId,
    pub status: AttemptStatus,
    pub started_at: String,
    pub ended_at: Option<String>,
    /// Free-form diagnostic text from the integrity check or failure.
    pub integrity: Option<String>,
}

impl ConversionAttempt {
    /// Column list matching [`ConversionAttempt::from_row`].
    pub const COLS: &'static str = "id, job_id, status, started_at, ended_at, integrity";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let status_raw: String = row.get(2)?;
        let status = AttemptStatus::from_str(&status_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: parse_id(row, 0)?,
            job_id: parse_id(row, 1)?,
            status,
            started_at: row.get(3)?,
            ended_at: row.get(4)?,
            integrity: row.get(5)?,
        })
    }
}
