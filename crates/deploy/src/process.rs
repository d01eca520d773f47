//! External process execution with bounded time budgets.
//!
//! A non-zero exit status is data, not an error: it is carried in [`CommandResult::exit_code`].
//! Errors are reserved for "the command could not be run to completion" (missing binary,
//! timeout, cancellation, spawn/wait failures).

use crate::error::{DeployError, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on how long we keep draining pipes after the child is gone. A grandchild that
/// inherited stdout can keep the pipe open forever; we stop reading instead of hanging.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Stderr when the command wrote any, stdout otherwise.
    pub fn diagnostic_output(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                out.push('\'');
                out.push_str(arg);
                out.push('\'');
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command to completion (or until its deadline / the cancellation token fires).
    async fn run(&self, spec: &CommandSpec, cancel: &CancellationToken) -> Result<CommandResult>;

    /// Resolve `program` on `PATH`, like `which`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands on the host via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, cancel: &CancellationToken) -> Result<CommandResult> {
        if let Some(cwd) = spec.cwd.as_deref() {
            if !cwd.is_dir() {
                return Err(DeployError::Execution {
                    program: spec.program.clone(),
                    message: format!("working directory {} does not exist", cwd.display()),
                });
            }
        }

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = spec.cwd.as_deref() {
            command.current_dir(cwd);
        }

        log::debug!("spawning `{}`", spec.display());
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(DeployError::BinaryNotFound {
                    program: spec.program.clone(),
                });
            }
            Err(err) => {
                return Err(DeployError::Execution {
                    program: spec.program.clone(),
                    message: err.to_string(),
                });
            }
        };

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::new();
        if let Some(pipe) = child.stdout.take() {
            readers.push(tokio::spawn(drain_pipe(pipe, stdout_buf.clone())));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(tokio::spawn(drain_pipe(pipe, stderr_buf.clone())));
        }

        let deadline = async {
            match spec.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            _ = deadline => WaitOutcome::TimedOut,
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
        };

        match outcome {
            WaitOutcome::Exited(Ok(status)) => {
                finish_readers(readers).await;
                let result = CommandResult {
                    exit_code: exit_code_of(status),
                    stdout: take_lossy(&stdout_buf),
                    stderr: take_lossy(&stderr_buf),
                    timed_out: false,
                };
                log::debug!("`{}` exited with {}", spec.program, result.exit_code);
                Ok(result)
            }
            WaitOutcome::Exited(Err(err)) => {
                finish_readers(readers).await;
                Err(DeployError::Execution {
                    program: spec.program.clone(),
                    message: err.to_string(),
                })
            }
            WaitOutcome::TimedOut => {
                let after = spec.timeout.unwrap_or_default();
                log::warn!("`{}` exceeded its {:?} budget; killing", spec.display(), after);
                let _ = child.start_kill();
                let _ = child.wait().await;
                finish_readers(readers).await;
                Err(DeployError::TimedOut {
                    program: spec.program.clone(),
                    after,
                    partial: CommandResult {
                        exit_code: -1,
                        stdout: take_lossy(&stdout_buf),
                        stderr: take_lossy(&stderr_buf),
                        timed_out: true,
                    },
                })
            }
            WaitOutcome::Cancelled => {
                log::warn!("`{}` cancelled by caller; killing", spec.display());
                let _ = child.start_kill();
                let _ = child.wait().await;
                finish_readers(readers).await;
                Err(DeployError::Cancelled {
                    program: spec.program.clone(),
                })
            }
        }
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which_in_path(program)
    }
}

enum WaitOutcome {
    Exited(io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

async fn drain_pipe<R>(mut pipe: R, sink: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

async fn finish_readers(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        let abort = reader.abort_handle();
        if tokio::time::timeout(PIPE_DRAIN_GRACE, reader).await.is_err() {
            abort.abort();
        }
    }
}

fn take_lossy(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    let bytes = buf
        .lock()
        .map(|mut guard| std::mem::take(&mut *guard))
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Search `PATH` for an executable named `program`. Paths with separators are checked as-is.
pub fn which_in_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
