//! Per-attempt scratch workspace.
//!
//! Every conversion attempt gets its own temporary directory under the
//! configured scratch root. The transcoder writes there; only
//! [`AttemptWorkspace::publish`] moves a verified output next to the
//! source. Dropping the workspace discards whatever is left in it, and
//! [`reset_scratch_root`] wipes the whole root when a run is interrupted.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch space for a single conversion attempt.
pub struct AttemptWorkspace {
    temp_dir: TempDir,
    source: PathBuf,
}

impl AttemptWorkspace {
    /// Create a workspace under `scratch_root` for converting `source`.
    ///
    /// The root is created if it does not exist yet.
    pub fn new(scratch_root: &Path, source: &Path) -> mf_core::Result<Self> {
        std::fs::create_dir_all(scratch_root)?;
        let temp_dir = TempDir::new_in(scratch_root).map_err(|e| mf_core::Error::Tool {
            tool: "workspace".to_string(),
            message: format!("failed to create temp dir: {e}"),
        })?;

        Ok(Self {
            temp_dir,
            source: source.to_path_buf(),
        })
    }

    /// The source file this attempt is converting.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where the transcoder should write: the source's file stem with an
    /// `.mp4` extension, inside the scratch directory.
    pub fn output(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .unwrap_or_else(|| std::ffi::OsStr::new("output"));
        let mut name = stem.to_os_string();
        name.push(".mp4");
        self.temp_dir.path().join(name)
    }

    /// Move the verified output next to the source and confirm it landed.
    ///
    /// The source file itself is not touched — deleting it is the caller's
    /// decision, made only after this returns the final path.
    ///
    /// # Errors
    ///
    /// Fails if the output was never written, if both rename and the
    /// copy-and-remove fallback fail, or if the moved file is not present
    /// at its final location afterwards.
    pub fn publish(self) -> mf_core::Result<PathBuf> {
        let output = self.output();
        if !output.exists() {
            return Err(mf_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("output file does not exist: {}", output.display()),
            });
        }

        let dir = self.source.parent().unwrap_or_else(|| Path::new("."));
        let dest = dir.join(output.file_name().unwrap_or_default());

        // Rename first (same filesystem), fall back to copy+remove.
        if std::fs::rename(&output, &dest).is_err() {
            std::fs::copy(&output, &dest).map_err(|e| mf_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("failed to move output to {}: {e}", dest.display()),
            })?;
            let _ = std::fs::remove_file(&output);
        }

        if !dest.exists() {
            return Err(mf_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("published file missing after move: {}", dest.display()),
            });
        }

        Ok(dest)
    }
}

/// Wipe and recreate the scratch root.
///
/// Used by the interruption path so a later run starts from an empty
/// scratch area regardless of what in-flight attempts left behind.
pub fn reset_scratch_root(scratch_root: &Path) -> mf_core::Result<()> {
    match std::fs::remove_dir_all(scratch_root) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    std::fs::create_dir_all(scratch_root)?;
    Ok(())
}
