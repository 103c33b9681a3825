//! Conversion orchestration.
//!
//! One job's attempt runs pre-check → transcode → post-check → publish,
//! with every transition durably recorded ([`ConversionExecutor`]); the
//! [`ConversionManager`] runs many such attempts over a bounded worker
//! pool with an orderly shutdown path.

mod error;
mod executor;
mod manager;

pub use error::ConversionError;
pub use executor::{AttemptOutcome, ConversionExecutor, ConversionSettings};
pub use manager::{ConversionManager, RunSummary};

/// Timestamp format shared by all store writes.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
