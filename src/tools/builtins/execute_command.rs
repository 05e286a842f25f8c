//! Command execution built-in tool.
//!
//! Runs an allowlisted command line through `sh -c` with timeout and
//! output capture. The command guard approves the whole line before any
//! process is spawned.

use crate::config::{DEFAULT_COMMAND_TIMEOUT_SECS, MAX_COMMAND_TIMEOUT_SECS};
use crate::security::{CommandGuard, PathGuard};
use crate::tools::builtins::{checked_path, require_non_empty};
use crate::tools::{parse_args, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;

const TOOL_NAME: &str = "execute_command";

/// Maximum output size kept per stream (1MB).
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Added to the maximum command timeout to form the registry deadline.
const REGISTRY_GRACE: Duration = Duration::from_secs(5);

/// Command execution tool executor.
#[derive(Debug, Clone)]
pub struct ExecuteCommandTool {
    commands: CommandGuard,
    paths: PathGuard,
    default_timeout: Duration,
    max_timeout: Duration,
}

/// Arguments for the execute_command tool.
#[derive(Debug, Deserialize)]
struct ExecuteCommandArgs {
    /// Command line to execute
    command: String,
    /// Timeout in seconds
    #[serde(default)]
    timeout: Option<u64>,
    /// Working directory, inside the allowed directories
    #[serde(default)]
    cwd: Option<String>,
}

impl ExecuteCommandTool {
    /// Creates a command tool with the default timeouts.
    #[must_use]
    pub fn new(commands: CommandGuard, paths: PathGuard) -> Self {
        Self {
            commands,
            paths,
            default_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            max_timeout: Duration::from_secs(MAX_COMMAND_TIMEOUT_SECS),
        }
    }

    /// Sets the timeout used when none is requested and the upper clamp.
    #[must_use]
    pub fn with_timeouts(mut self, default_timeout: Duration, max_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self.max_timeout = max_timeout;
        self
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config(&self) -> ToolConfig {
        let default_secs = self.default_timeout.as_secs();
        let max_secs = self.max_timeout.as_secs();

        ToolConfig::new(ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: format!(
                "Execute a command line and capture its output. Only allowlisted commands may run: {}. Pipes and '&&'/';' chains are allowed when every part is allowlisted; redirection and substitution are not.",
                self.commands.prefixes().joined()
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command line to execute"
                    },
                    "timeout": {
                        "type": "integer",
                        "description": format!("Timeout in seconds (default: {default_secs}, max: {max_secs})"),
                        "minimum": 1,
                        "maximum": max_secs
                    },
                    "cwd": {
                        "type": "string",
                        "description": "Working directory, which must be inside the allowed directories"
                    }
                },
                "required": ["command"]
            }),
        })
        .with_timeout(self.max_timeout.saturating_add(REGISTRY_GRACE))
    }

    fn effective_timeout(&self, requested: Option<u64>) -> Duration {
        requested
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.max_timeout)
    }
}

/// Drains a pipe, keeping at most `MAX_OUTPUT_SIZE` bytes.
///
/// Reading continues past the limit so the child never blocks on a full pipe.
async fn capture<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<(Vec<u8>, bool)> {
    let Some(mut reader) = reader else {
        return Ok((Vec::new(), false));
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = MAX_OUTPUT_SIZE.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok((kept, truncated))
}

fn render(bytes: &[u8], truncated: bool) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated {
        text.push_str("\n\n... (output truncated)");
    }
    text
}

/// Kills the child and everything it started in the background.
///
/// The child leads its own process group, so `sleep 99 & echo` cannot leave
/// the sleep running with our pipes open.
async fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            tracing::debug!(pid, error = %e, "process group kill failed");
        }
    }
    let _ = child.kill().await;
}

impl ToolExecutorTrait for ExecuteCommandTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let tool = self.clone();

        Box::pin(async move {
            let args: ExecuteCommandArgs = parse_args(TOOL_NAME, args)?;

            tool.commands
                .validate(&args.command)
                .map_err(|rejection| ToolError::command_denied(TOOL_NAME, rejection))?;

            let cwd = match args.cwd.as_deref() {
                Some(dir) => {
                    let dir = checked_path(&tool.paths, TOOL_NAME, dir).await?;
                    let is_dir = tokio::fs::metadata(&dir)
                        .await
                        .map(|m| m.is_dir())
                        .unwrap_or(false);
                    if !is_dir {
                        return Err(ToolError::execution_failed(
                            TOOL_NAME,
                            format!("cwd is not a directory: {dir}"),
                        ));
                    }
                    Some(dir)
                }
                None => None,
            };

            let limit = tool.effective_timeout(args.timeout);

            let mut cmd = Command::new("sh");
            cmd.arg("-c")
                .arg(&args.command)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            #[cfg(unix)]
            cmd.process_group(0);
            if let Some(ref dir) = cwd {
                cmd.current_dir(dir.as_path());
            }

            let mut child = cmd.spawn().map_err(|e| {
                ToolError::execution_failed(TOOL_NAME, format!("failed to spawn process: {e}"))
            })?;
            tracing::debug!(pid = ?child.id(), timeout_secs = limit.as_secs(), "command spawned");

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();
            let result = timeout(limit, async {
                let (out, err) = tokio::join!(capture(stdout), capture(stderr));
                let status = child.wait().await?;
                Ok::<_, io::Error>((status, out?, err?))
            })
            .await;

            match result {
                Ok(Ok((status, (stdout_buf, stdout_cut), (stderr_buf, stderr_cut)))) => Ok(json!({
                    "exit_code": status.code().unwrap_or(-1),
                    "stdout": render(&stdout_buf, stdout_cut),
                    "stderr": render(&stderr_buf, stderr_cut),
                    "success": status.success(),
                    "truncated": stdout_cut || stderr_cut
                })),
                Ok(Err(e)) => Err(ToolError::execution_failed(
                    TOOL_NAME,
                    format!("process error: {e}"),
                )),
                Err(_) => {
                    kill_tree(&mut child).await;
                    Err(ToolError::timeout(TOOL_NAME, limit))
                }
            }
        })
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: ExecuteCommandArgs = parse_args(TOOL_NAME, args.clone())?;
        require_non_empty(TOOL_NAME, "command", &args.command)?;
        if args.timeout == Some(0) {
            return Err(ToolError::validation_failed(
                TOOL_NAME,
                "timeout must be at least 1 second",
            ));
        }
        Ok(())
    }
}
