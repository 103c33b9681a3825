//! Builder for executing external tool commands.
//!
//! Two execution modes: [`ToolCommand::execute`] fails on a non-zero exit
//! (probe, transcode), while [`ToolCommand::capture`] hands back the raw
//! output regardless of status (integrity checks read stderr themselves).
//! A timeout is optional — transcode runtime is unbounded and proportional
//! to file size, so the transcoder runs without one.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Command;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use mf_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mf_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("-show_streams")
///     .arg("/path/to/video.mkv")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path. No timeout is set
    /// by default.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command and capture its output without judging the exit
    /// status. Spawn failures and timeouts still error.
    pub async fn capture(&self) -> mf_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| mf_core::Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(r) => r,
                Err(_elapsed) => {
                    // kill_on_drop reaps the child once the cancelled
                    // future is dropped.
                    return Err(mf_core::Error::Tool {
                        tool: program_name,
                        message: format!("timed out after {limit:?}"),
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|e| mf_core::Error::Tool {
            tool: program_name,
            message: format!("I/O error waiting for process: {e}"),
        })?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Execute the command, treating a non-zero exit as an error.
    ///
    /// # Errors
    ///
    /// - [`mf_core::Error::Tool`] if spawning fails or the timeout expires.
    /// - [`mf_core::Error::Tool`] if the process exits non-zero (message
    ///   includes trimmed stderr).
    pub async fn execute(&self) -> mf_core::Result<ToolOutput> {
        let output = self.capture().await?;

        if !output.status.success() {
            return Err(mf_core::Error::Tool {
                tool: self.program_name(),
                message: format!(
                    "exited with status {}: {}",
                    output.status,
                    output.stderr.trim()
                ),
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        // `echo` should be universally available.
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn capture_preserves_failure_status() {
        // `false` exits 1; capture must not turn that into an error.
        let result = ToolCommand::new(PathBuf::from("false")).capture().await;
        match result {
            Ok(out) => assert!(!out.status.success()),
            Err(_) => {
                // Environment without `false`; skip.
            }
        }
    }

    #[tokio::test]
    async fn timeout_fires() {
        // `sleep 10` should be killed well before 10 seconds.
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timed out"), "unexpected error: {err}");
    }
}
