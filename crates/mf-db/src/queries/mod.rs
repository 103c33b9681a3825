//! Query modules implementing the job store surface.

pub mod attempts;
pub mod jobs;
