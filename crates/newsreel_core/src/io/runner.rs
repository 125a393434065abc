//! Command runner for external process execution.
//!
//! Every external tool invocation in the pipeline goes through this runner.
//! All calls are synchronous; a deadline is enforced on every invocation and
//! a killed process surfaces as `StageError::Timeout` so a hung encoder
//! fails the owning stage instead of stalling the whole run.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::orchestrator::errors::{StageError, StageResult};

/// Captured output of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Runs external commands with a hard deadline.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program` with `args`, capturing stdout and stderr.
    ///
    /// A non-zero exit status is not an error at this layer - callers decide
    /// what a failed exit means for their stage. Spawn failures, I/O failures
    /// and deadline kills are errors.
    pub fn run<I, S>(&self, program: &Path, args: I) -> StageResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = tool_name(program);
        tracing::debug!(tool = %tool, "running external command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    StageError::file_not_found(program.display().to_string())
                }
                _ => StageError::io_error(format!("spawning {}", tool), e),
            })?;

        // Drain both pipes on threads so a chatty tool can't fill a pipe
        // buffer and deadlock against our wait loop.
        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        let status = self.wait_with_deadline(&mut child, &tool)?;

        let stdout = join_reader(stdout_handle);
        let stderr = join_reader(stderr_handle);

        let exit_code = status.code().unwrap_or(-1);
        Ok(CommandOutput {
            stdout,
            stderr,
            success: status.success(),
            exit_code,
        })
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        tool: &str,
    ) -> StageResult<std::process::ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child
                .try_wait()
                .map_err(|e| StageError::io_error(format!("waiting for {}", tool), e))?
            {
                Some(status) => return Ok(status),
                None => {
                    if Instant::now() >= deadline {
                        tracing::warn!(tool = %tool, "deadline exceeded, killing process");
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(StageError::timeout(tool, self.timeout.as_secs()));
                    }
                    thread::sleep(Duration::from_millis(25));
                }
            }
        }
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<thread::JoinHandle<Vec<u8>>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// Short tool name for error messages (file stem of the program path).
pub fn tool_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}
