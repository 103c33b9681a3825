//! External tool discovery.
//!
//! The [`Toolbox`] resolves the two tools this system invokes — ffmpeg and
//! ffprobe — from config overrides or `PATH`. Missing tools fail discovery
//! up front so no job is touched by a run that cannot finish.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;

/// Availability information for one tool, as reported by
/// [`Toolbox::check_all`].
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name.
    pub name: &'static str,
    /// Resolved path, when the tool was found.
    pub path: Option<PathBuf>,
    /// First line of `-version` output, when the tool runs.
    pub version: Option<String>,
}

/// Resolved paths for the external tools.
#[derive(Debug, Clone)]
pub struct Toolbox {
    /// Path to the ffmpeg binary.
    pub ffmpeg: PathBuf,
    /// Path to the ffprobe binary.
    pub ffprobe: PathBuf,
}

impl Toolbox {
    /// Resolve both tools, preferring existing override paths and falling
    /// back to a `PATH` lookup.
    ///
    /// # Errors
    ///
    /// Returns [`mf_core::Error::Tool`] naming the first tool that could
    /// not be resolved.
    pub fn discover(
        ffmpeg_override: Option<&Path>,
        ffprobe_override: Option<&Path>,
    ) -> mf_core::Result<Self> {
        Ok(Self {
            ffmpeg: resolve("ffmpeg", ffmpeg_override)?,
            ffprobe: resolve("ffprobe", ffprobe_override)?,
        })
    }

    /// Report availability and version of both tools without failing.
    pub async fn check_all(
        ffmpeg_override: Option<&Path>,
        ffprobe_override: Option<&Path>,
    ) -> Vec<ToolInfo> {
        let mut infos = Vec::new();
        for (name, over) in [("ffmpeg", ffmpeg_override), ("ffprobe", ffprobe_override)] {
            let path = resolve(name, over).ok();
            let version = match &path {
                Some(p) => probe_version(p).await,
                None => None,
            };
            infos.push(ToolInfo {
                name,
                path,
                version,
            });
        }
        infos
    }
}

fn resolve(name: &str, override_path: Option<&Path>) -> mf_core::Result<PathBuf> {
    if let Some(p) = override_path {
        if p.exists() {
            return Ok(p.to_path_buf());
        }
        tracing::warn!(
            "configured path for {} does not exist, falling back to PATH: {}",
            name,
            p.display()
        );
    }

    which::which(name).map_err(|_| mf_core::Error::Tool {
        tool: name.to_string(),
        message: "not found on PATH".to_string(),
    })
}

async fn probe_version(path: &Path) -> Option<String> {
    let output = ToolCommand::new(path.to_path_buf())
        .arg("-version")
        .timeout(std::time::Duration::from_secs(10))
        .execute()
        .await
        .ok()?;
    output.stdout.lines().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_missing_tool_errors() {
        let result = resolve("nonexistent_tool_xyz_12345", None);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_bad_override_falls_back() {
        // Override pointing nowhere must not be returned verbatim.
        let bogus = PathBuf::from("/nonexistent/override/ffxyz");
        let result = resolve("nonexistent_tool_xyz_12345", Some(&bogus));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn check_all_reports_both_tools() {
        let infos = Toolbox::check_all(None, None).await;
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].name, "ffmpeg");
        assert_eq!(infos[1].name, "ffprobe");
    }
}
