//! mf-core: shared types, IDs, errors, and the media domain model.
//!
//! This crate is the foundational dependency for the other mf-* crates,
//! providing type-safe identifiers, a unified error type, and the probe
//! output model the rest of the system is built around.

pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
