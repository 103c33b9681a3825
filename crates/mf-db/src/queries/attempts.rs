//! Conversion attempt operations.
//!
//! Attempts are append-only: a row is inserted when the executor begins
//! work on a job and receives exactly one terminal update. Reading a job's
//! attempts in insertion order reconstructs its full audit trail.

use rusqlite::Connection;

use mf_core::{AttemptId, Error, JobId, Result};

use crate::models::{AttemptStatus, ConversionAttempt};

/// Record the start of an attempt (status `converting`).
pub fn start_attempt(conn: &Connection, job_id: JobId, now: &str) -> Result<ConversionAttempt> {
    let id = AttemptId::new();
    conn.execute(
        "INSERT INTO conversion_attempts (id, job_id, status, started_at)
         VALUES (?1, ?2, 'converting', ?3)",
        rusqlite::params![id.to_string(), job_id.to_string(), now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ConversionAttempt {
        id,
        job_id,
        status: AttemptStatus::Converting,
        started_at: now.to_string(),
        ended_at: None,
        integrity: None,
    })
}

/// Insert an attempt that is already terminal.
///
/// Used when a job never reaches the converting phase — a failed
/// pre-check produces a `check_failed` record without a `converting`
/// predecessor.
pub fn insert_finished(
    conn: &Connection,
    job_id: JobId,
    status: AttemptStatus,
    started_at: &str,
    ended_at: &str,
    diagnostic: Option<&str>,
) -> Result<ConversionAttempt> {
    debug_assert!(status.is_terminal());
    let id = AttemptId::new();
    conn.execute(
        "INSERT INTO conversion_attempts (id, job_id, status, started_at, ended_at, integrity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            job_id.to_string(),
            status.as_str(),
            started_at,
            ended_at,
            diagnostic,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ConversionAttempt {
        id,
        job_id,
        status,
        started_at: started_at.to_string(),
        ended_at: Some(ended_at.to_string()),
        integrity: diagnostic.map(str::to_string),
    })
}

/// Record an attempt's terminal status. Single-row update keyed by the
/// attempt id.
pub fn finish_attempt(
    conn: &Connection,
    id: AttemptId,
    status: AttemptStatus,
    now: &str,
    diagnostic: Option<&str>,
) -> Result<bool> {
    debug_assert!(status.is_terminal());
    let n = conn
        .execute(
            "UPDATE conversion_attempts SET status = ?1, ended_at = ?2, integrity = ?3
             WHERE id = ?4",
            rusqlite::params![status.as_str(), now, diagnostic, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Bulk-transition every attempt still `converting` to `interrupted`.
///
/// Second line of defense for processes that died without running their
/// interruption handler; returns the number of attempts swept.
pub fn sweep_interrupted(conn: &Connection, now: &str) -> Result<usize> {
    let n = conn
        .execute(
            "UPDATE conversion_attempts SET status = 'interrupted', ended_at = ?1
             WHERE status = 'converting'",
            rusqlite::params![now],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n)
}

/// A job's attempts in creation order.
pub fn list_for_job(conn: &Connection, job_id: JobId) -> Result<Vec<ConversionAttempt>> {
    let q = format!(
        "SELECT {} FROM conversion_attempts WHERE job_id = ?1 ORDER BY started_at ASC, rowid ASC",
        ConversionAttempt::COLS
    );
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([job_id.to_string()], ConversionAttempt::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
