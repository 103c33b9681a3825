//! Media inspection: probing stream layout and checking file integrity.
//!
//! [`FfprobeInspector`] shells out to
//! `ffprobe -v quiet -print_format json -show_format -show_streams` and maps
//! the JSON into [`mf_core::MediaDescriptor`]. Integrity checks decode the
//! whole file with `ffmpeg -v error -i <file> -f null -`; any stderr output
//! or non-zero exit means the file is damaged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use mf_core::{CodecType, MediaDescriptor, StreamDescriptor};

use crate::command::ToolCommand;

/// Result of a full-file integrity scan.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// Whether the file decoded cleanly.
    pub ok: bool,
    /// Decoder diagnostics; `"No errors found"` on a clean scan.
    pub detail: String,
}

impl IntegrityReport {
    /// Report for a clean scan.
    pub fn clean() -> Self {
        Self {
            ok: true,
            detail: "No errors found".to_string(),
        }
    }
}

/// Boundary to the external media inspector.
///
/// The orchestrator only ever talks to this trait, so tests can substitute
/// an in-memory implementation.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Probe stream layout and container metadata.
    async fn probe(&self, path: &Path) -> mf_core::Result<MediaDescriptor>;

    /// Scan the whole file for decode errors.
    async fn check_integrity(&self, path: &Path) -> mf_core::Result<IntegrityReport>;
}

/// An inspector backed by the ffprobe and ffmpeg CLIs.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_path: PathBuf,
    ffmpeg_path: PathBuf,
    check_timeout: Duration,
}

impl FfprobeInspector {
    /// Create a new inspector. `check_timeout` bounds the integrity scan;
    /// probing uses a short fixed timeout of its own.
    pub fn new(ffprobe_path: PathBuf, ffmpeg_path: PathBuf, check_timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            ffmpeg_path,
            check_timeout,
        }
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn probe(&self, path: &Path) -> mf_core::Result<MediaDescriptor> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.timeout(Duration::from_secs(120));

        let output = cmd.execute().await?;
        let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
            .map_err(|e| mf_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

        parse_ffprobe_output(path, ff)
    }

    async fn check_integrity(&self, path: &Path) -> mf_core::Result<IntegrityReport> {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.args(["-v", "error", "-i"]);
        cmd.arg(path.to_string_lossy().as_ref());
        cmd.args(["-f", "null", "-"]);
        cmd.timeout(self.check_timeout);

        // The scan itself reporting problems is a verdict, not a tool
        // failure, so capture rather than execute.
        let output = cmd.capture().await?;

        if output.status.success() && output.stderr.trim().is_empty() {
            Ok(IntegrityReport::clean())
        } else {
            let detail = if output.stderr.trim().is_empty() {
                format!("decoder exited with status {}", output.status)
            } else {
                output.stderr.trim().to_string()
            };
            Ok(IntegrityReport { ok: false, detail })
        }
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    nb_streams: Option<u32>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: u8,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> mf_core::Result<MediaDescriptor> {
    let streams: Vec<StreamDescriptor> = output
        .streams
        .into_iter()
        .map(|s| StreamDescriptor {
            index: s.index,
            codec_type: map_codec_type(s.codec_type.as_deref().unwrap_or("")),
            codec_name: s.codec_name.unwrap_or_default(),
            language: s.tags.language,
            is_default: s.disposition.default == 1,
            title: s.tags.title,
        })
        .collect();

    let stream_count = output
        .format
        .nb_streams
        .unwrap_or(streams.len() as u32);

    let size_bytes = output
        .format
        .size
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let bit_rate = output.format.bit_rate.and_then(|s| s.parse::<u64>().ok());

    Ok(MediaDescriptor {
        path: path.to_path_buf(),
        stream_count,
        size_bytes,
        bit_rate,
        streams,
    })
}

fn map_codec_type(raw: &str) -> CodecType {
    match raw {
        "video" => CodecType::Video,
        "audio" => CodecType::Audio,
        _ => CodecType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "disposition": {"default": 1}
            },
            {
                "index": 1,
                "codec_name": "ac3",
                "codec_type": "audio",
                "disposition": {"default": 1},
                "tags": {"language": "rus", "title": "Dub"}
            },
            {
                "index": 2,
                "codec_name": "subrip",
                "codec_type": "subtitle",
                "disposition": {"default": 0},
                "tags": {"language": "eng"}
            }
        ],
        "format": {
            "filename": "/media/film.mkv",
            "nb_streams": 3,
            "size": "734003200",
            "bit_rate": "7340032"
        }
    }"#;

    #[test]
    fn parse_sample_output() {
        let ff: FfprobeOutput = serde_json::from_str(SAMPLE).unwrap();
        let descriptor = parse_ffprobe_output(Path::new("/media/film.mkv"), ff).unwrap();

        assert_eq!(descriptor.stream_count, 3);
        assert_eq!(descriptor.size_bytes, 734_003_200);
        assert_eq!(descriptor.bit_rate, Some(7_340_032));
        assert_eq!(descriptor.streams.len(), 3);

        let audio = &descriptor.streams[1];
        assert_eq!(audio.codec_type, CodecType::Audio);
        assert_eq!(audio.codec_name, "ac3");
        assert_eq!(audio.language.as_deref(), Some("rus"));
        assert!(audio.is_default);
        assert_eq!(audio.title.as_deref(), Some("Dub"));

        // Subtitle maps to Other.
        assert_eq!(descriptor.streams[2].codec_type, CodecType::Other);
    }

    #[test]
    fn parse_missing_optional_fields() {
        let ff: FfprobeOutput = serde_json::from_str(
            r#"{"streams": [{"index": 0}], "format": {}}"#,
        )
        .unwrap();
        let descriptor = parse_ffprobe_output(Path::new("/x.mkv"), ff).unwrap();
        assert_eq!(descriptor.stream_count, 1);
        assert_eq!(descriptor.size_bytes, 0);
        assert_eq!(descriptor.bit_rate, None);
        assert_eq!(descriptor.streams[0].codec_type, CodecType::Other);
        assert!(!descriptor.streams[0].is_default);
    }

    #[test]
    fn malformed_json_is_probe_error() {
        let err = serde_json::from_str::<FfprobeOutput>("not json").unwrap_err();
        // The inspector wraps this in Error::Probe; the parse itself must fail.
        assert!(err.to_string().contains("expected"));
    }
}
