//! Inventory scanner.
//!
//! Walks a directory tree (or takes a single file), probes each file, and
//! creates a job for every previously unknown path. Classification is an
//! operator input, never inferred from the tree. Probe failures are
//! logged and counted; they never abort a scan.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use mf_av::MediaInspector;
use mf_core::Classification;
use mf_db::pool::{get_conn, DbPool};
use mf_db::queries::jobs;

use crate::conversion::now;

/// What a scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// New jobs created.
    pub added: usize,
    /// Paths already under management.
    pub skipped: usize,
    /// Files the inspector could not probe.
    pub failed: usize,
}

/// Probes files and records them as jobs.
pub struct Scanner {
    pool: DbPool,
    inspector: Arc<dyn MediaInspector>,
}

impl Scanner {
    pub fn new(pool: DbPool, inspector: Arc<dyn MediaInspector>) -> Self {
        Self { pool, inspector }
    }

    /// Inventory every file under `dir`.
    pub async fn scan_directory(
        &self,
        dir: &Path,
        classification: Classification,
    ) -> mf_core::Result<ScanReport> {
        let mut report = ScanReport::default();

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            match self.add_file(entry.path(), classification).await {
                Ok(true) => report.added += 1,
                Ok(false) => {
                    debug!(path = %entry.path().display(), "already managed, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), "probe failed, skipping: {e}");
                    report.failed += 1;
                }
            }
        }

        info!(
            dir = %dir.display(),
            added = report.added,
            skipped = report.skipped,
            failed = report.failed,
            "scan finished"
        );
        Ok(report)
    }

    /// Inventory a single file. Returns `false` when the path is already
    /// managed.
    pub async fn add_file(
        &self,
        path: &Path,
        classification: Classification,
    ) -> mf_core::Result<bool> {
        let descriptor = self.inspector.probe(path).await?;
        let conn = get_conn(&self.pool)?;
        let created = jobs::create_job(&conn, classification, &descriptor, &now())?;
        Ok(created.is_some())
    }
}
