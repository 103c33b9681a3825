//! Mediaforge: bulk media conversion orchestrator.
//!
//! Inventories video files, probes their stream layout, transcodes
//! candidates to a normalized MP4 container through an external ffmpeg,
//! verifies the result, publishes it atomically, and records every state
//! transition durably so runs survive interruption.

pub mod catalog;
pub mod config;
pub mod conversion;
pub mod scanner;
