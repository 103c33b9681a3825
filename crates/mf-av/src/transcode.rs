//! Transcoding: pure argument construction plus the ffmpeg-backed
//! [`Transcoder`] implementation.
//!
//! Argument construction is a pure function of (input, output, params) so
//! the command line is testable without ever spawning ffmpeg.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::command::ToolCommand;

/// Parameters for one transcode invocation.
#[derive(Debug, Clone)]
pub struct TranscodeParams {
    /// Video bitrate, ffmpeg-style (e.g. "4096k").
    pub video_bitrate: String,
    /// Audio bitrate, ffmpeg-style (e.g. "192k").
    pub audio_bitrate: String,
    /// Absolute index of the audio stream to keep. `None` selects the
    /// fallback profile: first audio track, AAC.
    pub audio_stream: Option<u32>,
}

/// Build the ffmpeg argument list for a normalizing transcode.
///
/// The output container is MP4 with faststart, video re-encoded to H.264.
/// With a selected audio stream the track is mapped by absolute index and
/// kept as AC-3; without one, the first audio track is taken and encoded
/// to AAC.
pub fn build_transcode_args(input: &Path, output: &Path, params: &TranscodeParams) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-map".into(),
        "0:v:0".into(),
    ];

    match params.audio_stream {
        Some(index) => {
            args.extend([
                "-map".into(),
                format!("0:{index}"),
                "-c:a".into(),
                "ac3".into(),
            ]);
        }
        None => {
            args.extend([
                "-map".into(),
                "0:a:0".into(),
                "-c:a".into(),
                "aac".into(),
            ]);
        }
    }

    args.extend([
        "-b:v".into(),
        params.video_bitrate.clone(),
        "-b:a".into(),
        params.audio_bitrate.clone(),
        "-preset:v".into(),
        "ultrafast".into(),
        "-strict".into(),
        "experimental".into(),
        "-movflags".into(),
        "+faststart".into(),
        output.to_string_lossy().into_owned(),
    ]);

    args
}

/// Boundary to the external transcoder.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Re-encode `input` into `output` with the given parameters.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        params: &TranscodeParams,
    ) -> mf_core::Result<()>;
}

/// A transcoder that invokes the ffmpeg CLI.
///
/// No timeout is applied: transcode duration is unbounded and proportional
/// to file size.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a new transcoder using the given ffmpeg path.
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        params: &TranscodeParams,
    ) -> mf_core::Result<()> {
        let args = build_transcode_args(input, output, params);
        tracing::debug!("ffmpeg args: {:?}", args);

        ToolCommand::new(self.ffmpeg_path.clone())
            .args(args)
            .execute()
            .await?;

        Ok(())
    }
}
