//! Builder for executing external tool commands.
//!
//! Two execution modes: [`ToolCommand::execute`] captures output with a
//! timeout (used for probing), and [`ToolCommand::spawn_streaming`] hands
//! back a live line stream over the child's stdout (used for encode
//! progress).

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

/// Default command timeout for captured runs: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

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
/// use vp_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> vp_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("error")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("-show_streams")
///     .arg("/path/to/video.mp4")
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
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
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

    /// Set the maximum execution time for [`execute`](Self::execute).
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`vp_core::Error::Tool`] if the process times out, exits non-zero
    ///   (message includes stderr), or fails to spawn.
    pub async fn execute(&self) -> vp_core::Result<ToolOutput> {
        let program_name = self.program_name();
        tracing::debug!("Executing {program_name} {}", self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let child = cmd.spawn().map_err(|e| vp_core::Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(vp_core::Error::Tool {
                        tool: program_name,
                        message: format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    });
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(vp_core::Error::Tool {
                tool: program_name,
                message: format!("I/O error waiting for process: {e}"),
            }),
            Err(_elapsed) => Err(vp_core::Error::Tool {
                tool: program_name,
                message: format!("timed out after {:?}", self.timeout),
            }),
        }
    }

    /// Spawn the command and return a handle streaming its stdout line by
    /// line.
    ///
    /// No timeout applies: streaming runs (encodes) are open-ended and are
    /// gated on input duration before they start, not by wall clock.
    /// Stderr is drained concurrently so a chatty process cannot deadlock on
    /// a full pipe; its tail is available from [`StreamingChild::wait`] for
    /// diagnostics.
    pub fn spawn_streaming(&self) -> vp_core::Result<StreamingChild> {
        let program_name = self.program_name();
        tracing::debug!("Spawning {program_name} {}", self.args.join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| vp_core::Error::Tool {
            tool: program_name.clone(),
            message: format!("failed to spawn: {e}"),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| vp_core::Error::Tool {
            tool: program_name.clone(),
            message: "failed to capture stdout".into(),
        })?;

        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut collected = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    collected.push_str(&line);
                    collected.push('\n');
                }
            }
            collected
        });

        Ok(StreamingChild {
            tool: program_name,
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_task,
        })
    }
}

/// A spawned tool with a line-oriented view of its stdout.
pub struct StreamingChild {
    tool: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_task: tokio::task::JoinHandle<String>,
}

impl StreamingChild {
    /// Read the next stdout line; `None` at end of stream.
    pub async fn next_line(&mut self) -> vp_core::Result<Option<String>> {
        self.lines.next_line().await.map_err(|e| vp_core::Error::Tool {
            tool: self.tool.clone(),
            message: format!("failed to read output: {e}"),
        })
    }

    /// Wait for the process to exit, returning its status and collected
    /// stderr.
    pub async fn wait(mut self) -> vp_core::Result<(ExitStatus, String)> {
        let status = self.child.wait().await.map_err(|e| vp_core::Error::Tool {
            tool: self.tool.clone(),
            message: format!("I/O error waiting for process: {e}"),
        })?;
        let stderr = self.stderr_task.await.unwrap_or_default();
        Ok((status, stderr))
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

    #[tokio::test]
    async fn streaming_reads_lines_then_status() {
        let mut cmd = ToolCommand::new(PathBuf::from("sh"));
        cmd.args(["-c", "printf 'a\\nb\\n'"]);
        let mut child = match cmd.spawn_streaming() {
            Ok(c) => c,
            Err(_) => return, // no sh available; skip
        };

        let mut lines = Vec::new();
        while let Some(line) = child.next_line().await.unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, vec!["a", "b"]);

        let (status, _stderr) = child.wait().await.unwrap();
        assert!(status.success());
    }
}
