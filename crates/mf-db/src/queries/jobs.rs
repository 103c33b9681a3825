//! Job table operations.
//!
//! A job row is created when a file is first probed and never deleted,
//! only updated in place. Every write here is a single-row statement keyed
//! by the primary key, so concurrent workers cannot lose each other's
//! updates.

use rusqlite::Connection;

use mf_core::{Classification, Error, JobId, MediaDescriptor, Result};

use crate::models::Job;

/// Create a job for a freshly probed file, unless one already exists for
/// the same path.
///
/// Returns `None` when the path is already managed.
pub fn create_job(
    conn: &Connection,
    classification: Classification,
    descriptor: &MediaDescriptor,
    now: &str,
) -> Result<Option<Job>> {
    let path = descriptor.path.to_string_lossy();
    if select_by_path(conn, &path)?.is_some() {
        return Ok(None);
    }

    let id = JobId::new();
    let streams_json =
        serde_json::to_string(&descriptor.streams).map_err(|e| Error::database(e.to_string()))?;

    conn.execute(
        "INSERT INTO jobs (id, path, classification, converted, stream_count,
             size_bytes, bit_rate, streams, created_at, updated_at)
         VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8, ?8)",
        rusqlite::params![
            id.to_string(),
            path.as_ref(),
            classification.as_str(),
            descriptor.stream_count,
            descriptor.size_bytes as i64,
            descriptor.bit_rate.map(|b| b as i64),
            streams_json,
            now,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Some(Job {
        id,
        path: path.into_owned(),
        classification,
        converted: false,
        stream_count: descriptor.stream_count,
        size_bytes: descriptor.size_bytes,
        bit_rate: descriptor.bit_rate,
        streams: descriptor.streams.clone(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }))
}

/// Get a job by ID.
pub fn get_job(conn: &Connection, id: JobId) -> Result<Option<Job>> {
    let q = format!("SELECT {} FROM jobs WHERE id = ?1", Job::COLS);
    match conn.query_row(&q, [id.to_string()], Job::from_row) {
        Ok(job) => Ok(Some(job)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Look a job up by its current path.
pub fn select_by_path(conn: &Connection, path: &str) -> Result<Option<Job>> {
    let q = format!("SELECT {} FROM jobs WHERE path = ?1", Job::COLS);
    match conn.query_row(&q, [path], Job::from_row) {
        Ok(job) => Ok(Some(job)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Jobs eligible for conversion: more streams than the threshold and not
/// yet converted (quarantined sources count as converted and drop out
/// here, but stay visible in the full listing).
pub fn select_candidates(conn: &Connection, min_streams: u32) -> Result<Vec<Job>> {
    let q = format!(
        "SELECT {} FROM jobs WHERE stream_count > ?1 AND converted = 0 ORDER BY created_at ASC",
        Job::COLS
    );
    collect_jobs(conn, &q, rusqlite::params![min_streams])
}

/// Candidates whose path lies under the given directory prefix.
pub fn select_under_directory(
    conn: &Connection,
    prefix: &str,
    min_streams: u32,
) -> Result<Vec<Job>> {
    let pattern = format!("{}%", prefix.trim_end_matches('/'));
    let q = format!(
        "SELECT {} FROM jobs
         WHERE path LIKE ?1 AND stream_count > ?2 AND converted = 0
         ORDER BY created_at ASC",
        Job::COLS
    );
    collect_jobs(conn, &q, rusqlite::params![pattern, min_streams])
}

/// List every job, regardless of eligibility.
pub fn list_jobs(conn: &Connection) -> Result<Vec<Job>> {
    let q = format!("SELECT {} FROM jobs ORDER BY created_at ASC", Job::COLS);
    collect_jobs(conn, &q, rusqlite::params![])
}

/// Set or clear the converted flag.
pub fn mark_converted(conn: &Connection, id: JobId, converted: bool, now: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE jobs SET converted = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![converted as i64, now, id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Replace a job's path and metadata after a verified publish.
///
/// The stream snapshot is wholesale replaced with the fresh probe of the
/// published file.
pub fn update_after_publish(
    conn: &Connection,
    id: JobId,
    descriptor: &MediaDescriptor,
    now: &str,
) -> Result<bool> {
    let streams_json =
        serde_json::to_string(&descriptor.streams).map_err(|e| Error::database(e.to_string()))?;

    let n = conn
        .execute(
            "UPDATE jobs SET path = ?1, converted = 1, stream_count = ?2,
                 size_bytes = ?3, bit_rate = ?4, streams = ?5, updated_at = ?6
             WHERE id = ?7",
            rusqlite::params![
                descriptor.path.to_string_lossy().into_owned(),
                descriptor.stream_count,
                descriptor.size_bytes as i64,
                descriptor.bit_rate.map(|b| b as i64),
                streams_json,
                now,
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

fn collect_jobs(
    conn: &Connection,
    query: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Job>> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(params, Job::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use mf_core::{CodecType, StreamDescriptor};
    use std::path::PathBuf;

    fn descriptor(path: &str, stream_count: u32) -> MediaDescriptor {
        MediaDescriptor {
            path: PathBuf::from(path),
            stream_count,
            size_bytes: 734_003_200,
            bit_rate: Some(7_340_032),
            streams: vec![StreamDescriptor {
                index: 0,
                codec_type: CodecType::Video,
                codec_name: "h264".into(),
                language: None,
                is_default: true,
                title: None,
            }],
        }
    }

    #[test]
    fn create_job_is_idempotent_per_path() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let d = descriptor("/media/a.mkv", 4);
        let first = create_job(&conn, Classification::Film, &d, "t1").unwrap();
        assert!(first.is_some());

        let second = create_job(&conn, Classification::Film, &d, "t2").unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn candidates_require_streams_and_not_converted() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let eligible = create_job(&conn, Classification::Film, &descriptor("/a.mkv", 5), "t")
            .unwrap()
            .unwrap();
        // Two streams only: below the threshold.
        create_job(&conn, Classification::Film, &descriptor("/b.mkv", 2), "t")
            .unwrap()
            .unwrap();
        let converted = create_job(&conn, Classification::Series, &descriptor("/c.mkv", 6), "t")
            .unwrap()
            .unwrap();
        mark_converted(&conn, converted.id, true, "t2").unwrap();

        let candidates = select_candidates(&conn, 2).unwrap();
        let ids: Vec<JobId> = candidates.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![eligible.id]);
    }

    #[test]
    fn under_directory_filters_by_prefix() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let film = create_job(
            &conn,
            Classification::Film,
            &descriptor("/media/films/a.mkv", 4),
            "t",
        )
        .unwrap()
        .unwrap();
        create_job(
            &conn,
            Classification::Series,
            &descriptor("/media/series/s01e01.mkv", 4),
            "t",
        )
        .unwrap()
        .unwrap();

        let under = select_under_directory(&conn, "/media/films/", 2).unwrap();
        assert_eq!(under.len(), 1);
        assert_eq!(under[0].id, film.id);
    }

    #[test]
    fn publish_replaces_path_and_snapshot() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let job = create_job(&conn, Classification::Film, &descriptor("/a.mkv", 5), "t")
            .unwrap()
            .unwrap();

        let mut fresh = descriptor("/a.mp4", 2);
        fresh.size_bytes = 100;
        fresh.bit_rate = None;
        assert!(update_after_publish(&conn, job.id, &fresh, "t2").unwrap());

        let reread = get_job(&conn, job.id).unwrap().unwrap();
        assert_eq!(reread.path, "/a.mp4");
        assert!(reread.converted);
        assert_eq!(reread.stream_count, 2);
        assert_eq!(reread.size_bytes, 100);
        assert_eq!(reread.bit_rate, None);
        assert_eq!(reread.updated_at, "t2");

        // The old path no longer resolves; the new one does.
        assert!(select_by_path(&conn, "/a.mkv").unwrap().is_none());
        assert!(select_by_path(&conn, "/a.mp4").unwrap().is_some());
    }

    #[test]
    fn list_jobs_includes_converted() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let job = create_job(&conn, Classification::Film, &descriptor("/a.mkv", 5), "t")
            .unwrap()
            .unwrap();
        mark_converted(&conn, job.id, true, "t2").unwrap();

        assert_eq!(list_jobs(&conn).unwrap().len(), 1);
        assert!(select_candidates(&conn, 2).unwrap().is_empty());
    }
}
