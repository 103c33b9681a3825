//! Audio stream selection.
//!
//! Picks the audio track to keep when normalizing a multi-track container.
//! Preference order: the default-flagged Russian track, then any Russian
//! track, lowest stream index winning ties. Returning `None` sends the
//! caller to the fallback transcode profile (first audio track).

use mf_core::{CodecType, StreamDescriptor};

/// Select the audio stream to keep.
///
/// Deterministic and side-effect free: the same stream list always yields
/// the same index. A stream without a language tag never matches — it is
/// not an error.
pub fn select_audio_stream(streams: &[StreamDescriptor]) -> Option<u32> {
    let rus_audio = || {
        streams
            .iter()
            .filter(|s| s.codec_type == CodecType::Audio)
            .filter(|s| s.language.as_deref() == Some("rus"))
    };

    if let Some(index) = rus_audio().filter(|s| s.is_default).map(|s| s.index).min() {
        return Some(index);
    }

    rus_audio().map(|s| s.index).min()
}
