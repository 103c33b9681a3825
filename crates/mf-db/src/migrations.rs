//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;

use mf_core::{Error, Result};

/// V1: initial schema -- jobs and their append-only conversion attempts.
const V1_INITIAL: &str = r#"
-- One row per managed media file.
CREATE TABLE jobs (
    id             TEXT PRIMARY KEY,
    path           TEXT NOT NULL UNIQUE,
    classification TEXT NOT NULL,
    converted      INTEGER NOT NULL DEFAULT 0,
    stream_count   INTEGER NOT NULL,
    size_bytes     INTEGER NOT NULL,
    bit_rate       INTEGER,
    streams        TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Append-only audit of pre-check/convert/post-check cycles.
CREATE TABLE conversion_attempts (
    id         TEXT PRIMARY KEY,
    job_id     TEXT NOT NULL REFERENCES jobs(id),
    status     TEXT NOT NULL,
    started_at TEXT NOT NULL,
    ended_at   TEXT,
    integrity  TEXT
);

CREATE INDEX idx_jobs_converted ON jobs(converted, stream_count);
CREATE INDEX idx_attempts_job ON conversion_attempts(job_id, started_at);
CREATE INDEX idx_attempts_status ON conversion_attempts(status);
"#;

/// All migrations in order. The array index + 1 is the version number.
const MIGRATIONS: &[&str] = &[V1_INITIAL];

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::database(e.to_string()))?;

    for (i, sql) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i64;
        if version <= current {
            continue;
        }

        tracing::debug!("applying schema migration v{version}");
        conn.execute_batch(sql)
            .map_err(|e| Error::database(format!("migration v{version} failed: {e}")))?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // A second run must be a no-op, not a CREATE TABLE failure.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row(
                "SELECT MAX(version) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }

    #[test]
    fn v1_creates_both_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["jobs", "conversion_attempts"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[test]
    fn job_path_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO jobs (id, path, classification, converted, stream_count,
                          size_bytes, streams, created_at, updated_at)
                      VALUES (?1, '/same.mkv', 'film', 0, 3, 1, '[]', 't', 't')";
        conn.execute(insert, ["a"]).unwrap();
        assert!(conn.execute(insert, ["b"]).is_err());
    }
}
