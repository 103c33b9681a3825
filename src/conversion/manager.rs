//! Bounded worker pool over candidate jobs.
//!
//! Jobs are independent: workers pull from a shared bounded queue with no
//! ordering guarantee across jobs, while each job's attempt runs strictly
//! sequentially inside one worker. Candidates are deduplicated by job id
//! before dispatch, so a job can never be in flight twice within a run.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

use mf_av::reset_scratch_root;
use mf_db::models::{AttemptStatus, Job};
use mf_db::pool::get_conn;
use mf_db::queries::attempts;

use crate::conversion::{now, AttemptOutcome, ConversionExecutor};

/// Tallies for one `run_all` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub errors: usize,
    pub check_failed: usize,
    pub interrupted: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Skipped => self.skipped += 1,
            AttemptOutcome::Finished(AttemptStatus::Done) => self.done += 1,
            AttemptOutcome::Finished(AttemptStatus::Error) => self.errors += 1,
            AttemptOutcome::Finished(AttemptStatus::CheckFailed) => self.check_failed += 1,
            AttemptOutcome::Finished(AttemptStatus::Interrupted) => self.interrupted += 1,
            AttemptOutcome::Finished(AttemptStatus::Converting) => {}
        }
    }

    fn merge(&mut self, other: RunSummary) {
        self.done += other.done;
        self.errors += other.errors;
        self.check_failed += other.check_failed;
        self.interrupted += other.interrupted;
        self.skipped += other.skipped;
    }
}

/// Runs the executor over a set of jobs with bounded parallelism.
pub struct ConversionManager {
    executor: Arc<ConversionExecutor>,
    max_parallel: usize,
}

impl ConversionManager {
    pub fn new(executor: Arc<ConversionExecutor>, max_parallel: usize) -> Self {
        Self {
            executor,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Process every job in `jobs`, at most `max_parallel` at a time.
    ///
    /// One job's failure never aborts the pool. On cancellation the
    /// in-flight attempts record themselves `interrupted` at their next
    /// phase boundary; afterwards the store-wide sweep and a scratch wipe
    /// run as the second line of defense.
    pub async fn run_all(
        &self,
        jobs: Vec<Job>,
        cancel: CancellationToken,
    ) -> mf_core::Result<RunSummary> {
        // A job must never be dispatched twice within a run.
        let mut seen = HashSet::new();
        let jobs: Vec<Job> = jobs.into_iter().filter(|j| seen.insert(j.id)).collect();

        info!(
            jobs = jobs.len(),
            workers = self.max_parallel,
            "starting conversion run"
        );

        let (send_to_pool, recv_from_pool) = async_channel::bounded::<Job>(self.max_parallel);

        let mut workers = Vec::new();
        for worker_no in 0..self.max_parallel {
            let recv_from_pool = recv_from_pool.clone();
            let cancel = cancel.clone();
            let executor = Arc::clone(&self.executor);
            workers.push(tokio::spawn(
                async move {
                    let mut local = RunSummary::default();
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!("worker cancelled");
                                break;
                            }
                            job = recv_from_pool.recv() => {
                                let job = match job {
                                    // Channel closed and drained: no more work.
                                    Err(_) => break,
                                    Ok(job) => job,
                                };
                                match executor.process_job(&job, &cancel).await {
                                    Ok(outcome) => local.record(outcome),
                                    Err(e) => {
                                        error!(job = %job.id, "store error, job skipped this pass: {e}");
                                        local.skipped += 1;
                                    }
                                }
                            }
                        }
                    }
                    local
                }
                .instrument(tracing::info_span!("worker", no = worker_no)),
            ));
        }
        drop(recv_from_pool);

        for job in jobs {
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = send_to_pool.send(job) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        drop(send_to_pool);

        let mut summary = RunSummary::default();
        for joined in futures::future::join_all(workers).await {
            match joined {
                Ok(local) => summary.merge(local),
                Err(e) => error!("worker panicked: {e}"),
            }
        }

        if cancel.is_cancelled() {
            info!("run cancelled, sweeping in-flight attempts");
            let conn = get_conn(self.executor.pool())?;
            let swept = attempts::sweep_interrupted(&conn, &now())?;
            summary.interrupted += swept;
            reset_scratch_root(&self.executor.settings().scratch_root)?;
        }

        info!(?summary, "conversion run finished");
        Ok(summary)
    }
}
