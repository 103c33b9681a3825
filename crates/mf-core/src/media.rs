//! Media domain model: probe output snapshots and job classification.
//!
//! [`MediaDescriptor`] mirrors what the external inspector reports for one
//! file; a job's stream list is wholesale replaced with a fresh snapshot
//! whenever new probe data is recorded, never merged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How a managed file is classified. Fixed at job creation, never derived
/// by the orchestrator itself — the operator supplies it when a file is
/// inventoried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Film,
    Series,
}

impl Classification {
    /// Stable string form used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "film" => Ok(Self::Film),
            "series" => Ok(Self::Series),
            other => Err(crate::Error::Validation(format!(
                "unknown classification: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CodecType
// ---------------------------------------------------------------------------

/// Coarse stream kind as reported by the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    Video,
    Audio,
    /// Subtitles, attachments, data tracks — anything that is neither
    /// video nor audio.
    Other,
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Other => write!(f, "other"),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamDescriptor
// ---------------------------------------------------------------------------

/// One elementary stream inside a probed file.
///
/// Immutable once attached to a [`MediaDescriptor`] snapshot. `index` is
/// unique within a snapshot; no other field is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream index in probe order.
    pub index: u32,
    /// Coarse stream kind.
    pub codec_type: CodecType,
    /// Codec name as reported (e.g. "h264", "ac3").
    pub codec_name: String,
    /// Language tag, if the container carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Default disposition flag.
    #[serde(default)]
    pub is_default: bool,
    /// Stream title, if the container carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// MediaDescriptor
// ---------------------------------------------------------------------------

/// Container-level metadata plus the ordered stream list for one file, as
/// reported by a single probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Path that was probed.
    pub path: PathBuf,
    /// Number of elementary streams in the container.
    pub stream_count: u32,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Overall bit rate in bits per second, when the container reports one.
    pub bit_rate: Option<u64>,
    /// Streams in probe order.
    pub streams: Vec<StreamDescriptor>,
}

impl MediaDescriptor {
    /// Iterate the audio streams in probe order.
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.codec_type == CodecType::Audio)
    }
}
