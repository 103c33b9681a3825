//! Conversion executor: drives exactly one job through its attempt
//! lifecycle.
//!
//! Phases run strictly in order — pre-check, transcode, post-check,
//! publish — with the cancellation token consulted at every phase
//! boundary. All failures are translated into terminal attempt statuses
//! here; nothing propagates into the pool except store access errors,
//! which the manager logs per job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mf_av::{
    select_audio_stream, AttemptWorkspace, MediaInspector, TranscodeParams, Transcoder,
};
use mf_core::{Classification, MediaDescriptor};
use mf_db::models::{AttemptStatus, Job};
use mf_db::pool::{get_conn, DbPool};
use mf_db::queries::{attempts, jobs};

use crate::catalog::UrlCatalog;
use crate::config::Config;
use crate::conversion::{now, ConversionError};

/// Fixed parameters for a conversion run.
///
/// Bitrate selection is a pure lookup keyed by the job's classification;
/// there are no dynamic heuristics.
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub video_bitrate_film: String,
    pub video_bitrate_series: String,
    pub audio_bitrate: String,
    /// Jobs need strictly more streams than this to be worth normalizing.
    pub min_streams: u32,
    /// Root for per-attempt scratch directories.
    pub scratch_root: PathBuf,
}

impl ConversionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            video_bitrate_film: config.transcode.video_bitrate_film.clone(),
            video_bitrate_series: config.transcode.video_bitrate_series.clone(),
            audio_bitrate: config.transcode.audio_bitrate.clone(),
            min_streams: config.transcode.min_streams,
            scratch_root: config.storage.temp_dir.clone(),
        }
    }

    /// Video bitrate preset for a classification.
    pub fn video_bitrate_for(&self, classification: Classification) -> &str {
        match classification {
            Classification::Film => &self.video_bitrate_film,
            Classification::Series => &self.video_bitrate_series,
        }
    }
}

/// What processing one job amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No attempt was made: job ineligible, cancelled before start, or the
    /// inspection tool failed (retried next pass).
    Skipped,
    /// An attempt ran and ended in this terminal status.
    Finished(AttemptStatus),
}

/// Drives one job per call through pre-check → transcode → post-check →
/// publish, recording every transition in the store.
pub struct ConversionExecutor {
    pool: DbPool,
    inspector: Arc<dyn MediaInspector>,
    transcoder: Arc<dyn Transcoder>,
    catalog: Arc<dyn UrlCatalog>,
    settings: ConversionSettings,
}

impl ConversionExecutor {
    pub fn new(
        pool: DbPool,
        inspector: Arc<dyn MediaInspector>,
        transcoder: Arc<dyn Transcoder>,
        catalog: Arc<dyn UrlCatalog>,
        settings: ConversionSettings,
    ) -> Self {
        Self {
            pool,
            inspector,
            transcoder,
            catalog,
            settings,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// Run one attempt for `job`.
    ///
    /// # Errors
    ///
    /// Only store access failures surface as `Err`; every conversion-level
    /// failure is recorded durably and returned as a normal
    /// [`AttemptOutcome`].
    pub async fn process_job(
        &self,
        job: &Job,
        cancel: &CancellationToken,
    ) -> mf_core::Result<AttemptOutcome> {
        if job.converted || job.stream_count <= self.settings.min_streams {
            debug!(job = %job.id, "not a conversion candidate, skipping");
            return Ok(AttemptOutcome::Skipped);
        }
        if cancel.is_cancelled() {
            return Ok(AttemptOutcome::Skipped);
        }

        info!(job = %job.id, path = %job.path, "pre-checking source");

        // PreChecking: a damaged source is quarantined so it stops being
        // re-selected; a failing inspection tool just skips the pass.
        let report = match self.inspector.check_integrity(Path::new(&job.path)).await {
            Ok(report) => report,
            Err(e) => {
                warn!(job = %job.id, "{}", ConversionError::Probe(e));
                return Ok(AttemptOutcome::Skipped);
            }
        };

        if !report.ok {
            let err = ConversionError::PreCheckFailed(report.detail);
            warn!(job = %job.id, path = %job.path, "{err}; quarantining source");
            let diagnostic = err.to_string();
            let conn = get_conn(&self.pool)?;
            let ts = now();
            attempts::insert_finished(
                &conn,
                job.id,
                AttemptStatus::CheckFailed,
                &ts,
                &ts,
                Some(&diagnostic),
            )?;
            jobs::mark_converted(&conn, job.id, true, &ts)?;
            return Ok(AttemptOutcome::Finished(AttemptStatus::CheckFailed));
        }

        let workspace = AttemptWorkspace::new(&self.settings.scratch_root, Path::new(&job.path))?;

        let attempt = {
            let conn = get_conn(&self.pool)?;
            attempts::start_attempt(&conn, job.id, &now())?
        };

        match self.run_attempt(job, workspace, cancel).await {
            Ok(integrity) => {
                let conn = get_conn(&self.pool)?;
                attempts::finish_attempt(
                    &conn,
                    attempt.id,
                    AttemptStatus::Done,
                    &now(),
                    Some(integrity.as_str()),
                )?;
                info!(job = %job.id, "conversion done");
                Ok(AttemptOutcome::Finished(AttemptStatus::Done))
            }
            Err(err) => {
                warn!(job = %job.id, "{err}");
                let status = err.terminal_status().unwrap_or(AttemptStatus::Error);
                let diagnostic = err.to_string();
                let conn = get_conn(&self.pool)?;
                if err.marks_converted() {
                    jobs::mark_converted(&conn, job.id, true, &now())?;
                }
                attempts::finish_attempt(&conn, attempt.id, status, &now(), Some(&diagnostic))?;
                Ok(AttemptOutcome::Finished(status))
            }
        }
    }

    /// The converting → post-checking → publishing phases. The workspace is
    /// consumed: on any error path it is dropped and its scratch contents
    /// discarded with it.
    async fn run_attempt(
        &self,
        job: &Job,
        workspace: AttemptWorkspace,
        cancel: &CancellationToken,
    ) -> Result<String, ConversionError> {
        if cancel.is_cancelled() {
            return Err(ConversionError::Interrupted);
        }

        let params = TranscodeParams {
            video_bitrate: self
                .settings
                .video_bitrate_for(job.classification)
                .to_string(),
            audio_bitrate: self.settings.audio_bitrate.clone(),
            audio_stream: select_audio_stream(&job.streams),
        };

        let output = workspace.output();
        info!(job = %job.id, output = %output.display(), audio = ?params.audio_stream, "transcoding");

        self.transcoder
            .transcode(Path::new(&job.path), &output, &params)
            .await
            .map_err(ConversionError::Transcode)?;

        if cancel.is_cancelled() {
            return Err(ConversionError::Interrupted);
        }

        // PostChecking: a bad output is discarded, the job stays eligible.
        let report = self
            .inspector
            .check_integrity(&output)
            .await
            .map_err(|e| ConversionError::PostCheckFailed(e.to_string()))?;
        if !report.ok {
            return Err(ConversionError::PostCheckFailed(report.detail));
        }

        if cancel.is_cancelled() {
            return Err(ConversionError::Interrupted);
        }

        // Publishing: move, update the job record, delete the source, then
        // remap the catalog. The source is only removed once the published
        // file is confirmed on disk.
        let source = job.path.clone();
        let final_path = workspace
            .publish()
            .map_err(|e| ConversionError::Publish(e.to_string()))?;

        let descriptor = match self.inspector.probe(&final_path).await {
            Ok(d) => d,
            Err(e) => {
                warn!(job = %job.id, "metadata refresh failed after publish: {e}");
                fallback_descriptor(&final_path)
            }
        };

        {
            let conn = get_conn(&self.pool)
                .map_err(|e| ConversionError::Publish(format!("store unavailable: {e}")))?;
            jobs::update_after_publish(&conn, job.id, &descriptor, &now())
                .map_err(|e| ConversionError::Publish(format!("job update failed: {e}")))?;
        }

        std::fs::remove_file(&source)
            .map_err(|e| ConversionError::Publish(format!("failed to remove original: {e}")))?;

        if let Err(e) = self
            .catalog
            .remap_url(&source, &final_path.to_string_lossy())
            .await
        {
            // Catalog state is external; its failures never affect the job.
            warn!(job = %job.id, "catalog remap failed: {e}");
        }

        info!(job = %job.id, new_path = %final_path.display(), "published");
        Ok(report.detail)
    }
}

/// Minimal descriptor when the fresh probe of a published file fails: the
/// path move must still be recorded.
fn fallback_descriptor(path: &Path) -> MediaDescriptor {
    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    MediaDescriptor {
        path: path.to_path_buf(),
        stream_count: 0,
        size_bytes,
        bit_rate: None,
        streams: Vec::new(),
    }
}
