//! mf-av: the external tool boundary.
//!
//! Everything that shells out lives here — the [`ToolCommand`] process
//! builder, ffprobe-backed inspection, ffmpeg-backed transcoding, and the
//! per-attempt scratch [`AttemptWorkspace`]. The inspector and transcoder
//! are exposed as traits so the orchestrator can be exercised without the
//! real tools.

pub mod command;
pub mod inspect;
pub mod select;
pub mod tools;
pub mod transcode;
pub mod workspace;

pub use command::{ToolCommand, ToolOutput};
pub use inspect::{FfprobeInspector, IntegrityReport, MediaInspector};
pub use select::select_audio_stream;
pub use tools::{ToolInfo, Toolbox};
pub use transcode::{build_transcode_args, FfmpegTranscoder, TranscodeParams, Transcoder};
pub use workspace::{reset_scratch_root, AttemptWorkspace};
