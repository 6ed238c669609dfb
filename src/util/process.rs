//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::util::context::CancellationToken;

/// How often a running child is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

/// Captured result of a finished (or killed) subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: Option<ExitStatus>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Set when the child was killed because cancellation was requested.
    pub cancelled: bool,
}

impl ProcessOutput {
    /// Whether the process ran to completion with a zero exit status.
    pub fn success(&self) -> bool {
        !self.cancelled && self.status.is_some_and(|s| s.success())
    }

    /// The exit code, if the process exited normally.
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    /// Lossy UTF-8 rendition of stderr, falling back to stdout when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        if stderr.trim().is_empty() {
            String::from_utf8_lossy(&self.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        }
    }
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<ProcessOutput> {
        self.exec_cancellable(&CancellationToken::new())
    }

    /// Execute the command, killing it if `cancel` is triggered while it runs.
    ///
    /// An `Err` means the process could not be launched or waited on; a
    /// non-zero exit is reported through the returned [`ProcessOutput`].
    pub fn exec_cancellable(&self, cancel: &CancellationToken) -> Result<ProcessOutput> {
        let mut child = self
            .build_command()
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        // Drain both pipes on their own threads so a chatty child can't block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let (status, cancelled) = self.wait(&mut child, cancel)?;

        Ok(ProcessOutput {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            cancelled,
        })
    }

    fn wait(
        &self,
        child: &mut Child,
        cancel: &CancellationToken,
    ) -> Result<(Option<ExitStatus>, bool)> {
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to wait for `{}`", self.program.display()))?
            {
                return Ok((Some(status), false));
            }

            if cancel.is_cancelled() {
                tracing::debug!("killing `{}`", self.program.display());
                // The child may have exited between the poll and the kill.
                let _ = child.kill();
                let status = child.wait().ok();
                return Ok((status, true));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Whether `program` can be launched: an existing file when given as a path,
/// otherwise something on PATH.
pub fn is_launchable(program: &Path) -> bool {
    if program.components().count() > 1 {
        program.is_file()
    } else {
        program
            .to_str()
            .and_then(find_executable)
            .is_some()
    }
}
