//! Running external tools with a bounded timeout.
//!
//! Output streams are redirected to anonymous temporary files rather than
//! pipes, so a chatty tool cannot block on a full pipe while we poll it.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum number of stderr bytes kept for diagnostics.
const MAX_STDERR: usize = 2048;

/// Error running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The program could not be found.
    #[error("`{program}` is not installed or not on PATH")]
    NotInstalled { program: String },
    /// The program ran longer than allowed and was killed.
    #[error("`{program}` timed out after {}s", .timeout.as_secs_f32())]
    TimedOut { program: String, timeout: Duration },
    /// The program exited unsuccessfully.
    #[error("`{program}` failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    /// Spawning or collecting output failed.
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Captured output of a successful run.
#[derive(Debug, Default)]
pub struct CommandOutput {
    /// Everything written to stdout.
    pub stdout: Vec<u8>,
    /// Everything written to stderr, lossily decoded.
    pub stderr: String,
}

/// An external program invocation with a timeout.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ExternalCommand {
    /// Create an invocation of `program` with a 30 second timeout.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set the maximum run time.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion, killing the child if it exceeds the timeout.
    pub fn run(&self) -> Result<CommandOutput, CommandError> {
        let io_err = |source| CommandError::Io {
            program: self.program.clone(),
            source,
        };

        let mut stdout_file = tempfile::tempfile().map_err(io_err)?;
        let mut stderr_file = tempfile::tempfile().map_err(io_err)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file.try_clone().map_err(io_err)?))
            .stderr(Stdio::from(stderr_file.try_clone().map_err(io_err)?))
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    CommandError::NotInstalled {
                        program: self.program.clone(),
                    }
                } else {
                    io_err(e)
                }
            })?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(io_err)? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = read_all(&mut stdout_file).map_err(io_err)?;
        let stderr = read_all(&mut stderr_file).map_err(io_err)?;
        let stderr = truncate(String::from_utf8_lossy(&stderr).trim());

        if !status.success() {
            return Err(CommandError::Failed {
                program: self.program.clone(),
                status,
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::debug!(program = %self.program, stderr = %stderr, "Tool wrote to stderr");
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn read_all(file: &mut File) -> io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn truncate(s: &str) -> String {
    if s.len() <= MAX_STDERR {
        return s.to_owned();
    }
    let mut end = MAX_STDERR;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
