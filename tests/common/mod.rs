//! Shared fixtures and mock collaborators for the conversion tests.
//!
//! The executor is exercised end-to-end against a real in-memory store and
//! real temp directories; only the external tools are mocked.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mediaforge::catalog::UrlCatalog;
use mediaforge::conversion::{ConversionExecutor, ConversionSettings};
use mf_av::{IntegrityReport, MediaInspector, TranscodeParams, Transcoder};
use mf_core::{Classification, CodecType, MediaDescriptor, StreamDescriptor};
use mf_db::models::Job;
use mf_db::pool::{init_memory_pool, DbPool};
use mf_db::queries::jobs;

// ---------------------------------------------------------------------------
// Mock inspector
// ---------------------------------------------------------------------------

pub type ProbeFn = dyn Fn(&Path) -> mf_core::Result<MediaDescriptor> + Send + Sync;
pub type CheckFn = dyn Fn(&Path) -> mf_core::Result<IntegrityReport> + Send + Sync;

/// Inspector whose probe and integrity behavior are supplied as closures.
pub struct MockInspector {
    pub on_probe: Box<ProbeFn>,
    pub on_check: Box<CheckFn>,
}

impl MockInspector {
    /// Every file is healthy; probing reports `fresh_streams` at whatever
    /// path is asked about.
    pub fn healthy(fresh_streams: Vec<StreamDescriptor>) -> Self {
        Self {
            on_probe: Box::new(move |path| Ok(descriptor_for(path, fresh_streams.clone()))),
            on_check: Box::new(|_| Ok(IntegrityReport::clean())),
        }
    }
}

#[async_trait]
impl MediaInspector for MockInspector {
    async fn probe(&self, path: &Path) -> mf_core::Result<MediaDescriptor> {
        (self.on_probe)(path)
    }

    async fn check_integrity(&self, path: &Path) -> mf_core::Result<IntegrityReport> {
        (self.on_check)(path)
    }
}

// ---------------------------------------------------------------------------
// Mock transcoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TranscodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: TranscodeParams,
}

type TranscodeFn = dyn Fn(&Path, &Path, &TranscodeParams) -> mf_core::Result<()> + Send + Sync;

/// Transcoder that records every invocation and delegates to a closure.
pub struct MockTranscoder {
    calls: Mutex<Vec<TranscodeCall>>,
    behavior: Box<TranscodeFn>,
}

impl MockTranscoder {
    /// Writes a small placeholder output file, like a successful encode.
    pub fn succeeding() -> Self {
        Self::with_behavior(|_, output, _| {
            std::fs::write(output, b"converted output")?;
            Ok(())
        })
    }

    /// Fails every invocation with a tool error.
    pub fn failing(message: &'static str) -> Self {
        Self::with_behavior(move |_, _, _| Err(mf_core::Error::tool("ffmpeg", message)))
    }

    pub fn with_behavior(
        behavior: impl Fn(&Path, &Path, &TranscodeParams) -> mf_core::Result<()>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            behavior: Box::new(behavior),
        }
    }

    pub fn calls(&self) -> Vec<TranscodeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        params: &TranscodeParams,
    ) -> mf_core::Result<()> {
        self.calls.lock().unwrap().push(TranscodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            params: params.clone(),
        });
        (self.behavior)(input, output, params)
    }
}

// ---------------------------------------------------------------------------
// Recording catalog
// ---------------------------------------------------------------------------

/// Catalog that records remaps and can be told to fail.
#[derive(Default)]
pub struct RecordingCatalog {
    remaps: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingCatalog {
    pub fn failing() -> Self {
        Self {
            remaps: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn remaps(&self) -> Vec<(String, String)> {
        self.remaps.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlCatalog for RecordingCatalog {
    async fn remap_url(&self, old_path: &str, new_path: &str) -> mf_core::Result<()> {
        self.remaps
            .lock()
            .unwrap()
            .push((old_path.to_string(), new_path.to_string()));
        if self.fail {
            return Err(mf_core::Error::tool("catalog", "portal unreachable"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn stream(
    index: u32,
    codec_type: CodecType,
    codec_name: &str,
    language: Option<&str>,
    is_default: bool,
) -> StreamDescriptor {
    StreamDescriptor {
        index,
        codec_type,
        codec_name: codec_name.to_string(),
        language: language.map(str::to_string),
        is_default,
        title: None,
    }
}

/// Five streams with one default rus audio at index 2.
pub fn film_layout() -> Vec<StreamDescriptor> {
    vec![
        stream(0, CodecType::Video, "h264", None, true),
        stream(1, CodecType::Audio, "aac", Some("eng"), false),
        stream(2, CodecType::Audio, "ac3", Some("rus"), true),
        stream(3, CodecType::Audio, "ac3", Some("rus"), false),
        stream(4, CodecType::Other, "subrip", Some("eng"), false),
    ]
}

/// Normalized layout of a published file: one video, one audio.
pub fn published_layout() -> Vec<StreamDescriptor> {
    vec![
        stream(0, CodecType::Video, "h264", None, true),
        stream(1, CodecType::Audio, "ac3", Some("rus"), true),
    ]
}

pub fn descriptor_for(path: &Path, streams: Vec<StreamDescriptor>) -> MediaDescriptor {
    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(4096);
    MediaDescriptor {
        path: path.to_path_buf(),
        stream_count: streams.len() as u32,
        size_bytes,
        bit_rate: Some(7_340_032),
        streams,
    }
}

pub fn mem_pool() -> DbPool {
    init_memory_pool().unwrap()
}

/// Write a real source file and record it as a job.
pub fn seed_job(
    pool: &DbPool,
    path: &Path,
    classification: Classification,
    streams: Vec<StreamDescriptor>,
) -> Job {
    std::fs::write(path, b"original source").unwrap();
    let descriptor = descriptor_for(path, streams);
    let conn = pool.get().unwrap();
    jobs::create_job(&conn, classification, &descriptor, "t0")
        .unwrap()
        .expect("job already existed")
}

pub fn settings(scratch_root: &Path) -> ConversionSettings {
    ConversionSettings {
        video_bitrate_film: "4096k".into(),
        video_bitrate_series: "2048k".into(),
        audio_bitrate: "192k".into(),
        min_streams: 2,
        scratch_root: scratch_root.to_path_buf(),
    }
}

pub fn make_executor(
    pool: DbPool,
    inspector: Arc<dyn MediaInspector>,
    transcoder: Arc<MockTranscoder>,
    catalog: Arc<RecordingCatalog>,
    scratch_root: &Path,
) -> Arc<ConversionExecutor> {
    Arc::new(ConversionExecutor::new(
        pool,
        inspector,
        transcoder,
        catalog,
        settings(scratch_root),
    ))
}
