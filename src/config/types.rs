//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub transcode: TranscodeConfig,
    pub tools: ToolsConfig,
    pub catalog: CatalogConfig,
    pub conversion: ConversionConfig,
}

/// Where the job store and the scratch area live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite job store.
    pub db_path: PathBuf,
    /// Root for per-attempt scratch directories.
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./mediaforge.db"),
            temp_dir: std::env::temp_dir().join("mediaforge"),
        }
    }
}

/// Transcode parameters. Bitrate presets are a pure lookup keyed by the
/// job's classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Video bitrate for films.
    pub video_bitrate_film: String,
    /// Video bitrate for series episodes.
    pub video_bitrate_series: String,
    /// Audio bitrate for the kept track.
    pub audio_bitrate: String,
    /// Jobs need strictly more streams than this to be candidates.
    pub min_streams: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            video_bitrate_film: "4096k".to_string(),
            video_bitrate_series: "2048k".to_string(),
            audio_bitrate: "192k".to_string(),
            min_streams: 2,
        }
    }
}

/// External tool locations and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Override path for ffmpeg; `PATH` lookup when unset.
    pub ffmpeg_path: Option<PathBuf>,
    /// Override path for ffprobe; `PATH` lookup when unset.
    pub ffprobe_path: Option<PathBuf>,
    /// Upper bound on integrity scans, in seconds. The transcode itself is
    /// never bounded.
    pub check_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            check_timeout_secs: 900,
        }
    }
}

/// External URL catalog that references managed files by path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Whether to notify the catalog after a publish.
    pub enabled: bool,
    /// Catalog service base URL.
    pub base_url: String,
    /// Bearer token, if the catalog requires one.
    pub token: Option<String>,
}

/// Worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Maximum concurrently running attempts. Each one keeps an external
    /// transcoder busy, so oversubscription degrades throughput.
    pub max_parallel: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self { max_parallel: 2 }
    }
}
