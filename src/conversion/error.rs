//! Conversion failure taxonomy.
//!
//! Every way an attempt can end short of `done`, and how each one maps to
//! the durable record. These never propagate past a single job's handling:
//! the executor translates them into terminal attempt statuses at its
//! boundary.

use mf_db::models::AttemptStatus;

/// Why a conversion attempt did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The inspection tool itself failed (spawn error, timeout,
    /// unparseable output). The job is skipped this pass and not marked
    /// failed.
    #[error("probe failed: {0}")]
    Probe(#[source] mf_core::Error),

    /// The source file is damaged. The job is quarantined: marked
    /// converted so it stops being re-selected, flagged in the audit trail
    /// for manual replacement.
    #[error("source failed integrity check: {0}")]
    PreCheckFailed(String),

    /// The external transcoder failed. The source is untouched and the job
    /// stays eligible for retry.
    #[error("transcode failed: {0}")]
    Transcode(#[source] mf_core::Error),

    /// The transcoded output is damaged. Output discarded, retry permitted.
    #[error("output failed integrity check: {0}")]
    PostCheckFailed(String),

    /// Moving or finalizing a verified output failed. Automatic retry
    /// risks data loss, so the job is flagged for manual inspection.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The run was cancelled mid-attempt. Always recoverable; retried on
    /// the next run.
    #[error("attempt interrupted")]
    Interrupted,
}

impl ConversionError {
    /// The terminal attempt status this failure is recorded as. `None`
    /// means no attempt record is written (probe failures skip the pass).
    pub fn terminal_status(&self) -> Option<AttemptStatus> {
        match self {
            Self::Probe(_) => None,
            Self::PreCheckFailed(_) => Some(AttemptStatus::CheckFailed),
            Self::Transcode(_) => Some(AttemptStatus::Error),
            Self::PostCheckFailed(_) => Some(AttemptStatus::CheckFailed),
            Self::Publish(_) => Some(AttemptStatus::CheckFailed),
            Self::Interrupted => Some(AttemptStatus::Interrupted),
        }
    }

    /// Whether this failure sets the job's converted flag.
    ///
    /// True for quarantined sources (stop re-selecting a doomed input) and
    /// publish failures (a verified output exists; only manual inspection
    /// can safely reconcile the files).
    pub fn marks_converted(&self) -> bool {
        matches!(self, Self::PreCheckFailed(_) | Self::Publish(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ConversionError::Probe(mf_core::Error::Probe("x".into())).terminal_status(),
            None
        );
        assert_eq!(
            ConversionError::PreCheckFailed("x".into()).terminal_status(),
            Some(AttemptStatus::CheckFailed)
        );
        assert_eq!(
            ConversionError::Transcode(mf_core::Error::tool("ffmpeg", "x")).terminal_status(),
            Some(AttemptStatus::Error)
        );
        assert_eq!(
            ConversionError::PostCheckFailed("x".into()).terminal_status(),
            Some(AttemptStatus::CheckFailed)
        );
        assert_eq!(
            ConversionError::Publish("x".into()).terminal_status(),
            Some(AttemptStatus::CheckFailed)
        );
        assert_eq!(
            ConversionError::Interrupted.terminal_status(),
            Some(AttemptStatus::Interrupted)
        );
    }

    #[test]
    fn only_quarantine_and_publish_mark_converted() {
        assert!(ConversionError::PreCheckFailed("x".into()).marks_converted());
        assert!(ConversionError::Publish("x".into()).marks_converted());
        assert!(!ConversionError::PostCheckFailed("x".into()).marks_converted());
        assert!(!ConversionError::Interrupted.marks_converted());
        assert!(!ConversionError::Transcode(mf_core::Error::tool("ffmpeg", "x")).marks_converted());
    }
}
