//! Agent process spawning and output collection.
//!
//! This module runs one external command per invocation, accumulates its
//! stdout and stderr, forwards decoded output to optional callbacks as it
//! arrives, and enforces a deadline after which the whole process group is
//! terminated.

use std::borrow::Cow;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::Instrument;
use uuid::Uuid;

/// Default deadline for an invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Time a process gets to exit after SIGTERM before it is killed.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Exit code reported when the process ended without one (killed by a signal).
pub const UNKNOWN_EXIT_CODE: i32 = 1;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary was not found.
    #[error("Binary not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, program: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Errors from running a process to completion.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    /// The deadline fired before the process exited.
    #[error("CLI process timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
    #[error("Process {0} pipe not available")]
    MissingPipe(&'static str),
    #[error("Failed to read process output: {0}")]
    Io(#[from] std::io::Error),
}

/// A single command to run, with its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    shell: bool,
    working_dir: Option<PathBuf>,
}

impl ProcessInvocation {
    /// Create an invocation of `program` with `args` and the default timeout.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            shell: false,
            working_dir: None,
        }
    }

    /// Set the deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run through the platform shell (`sh -c` / `cmd /C`) instead of
    /// executing the program directly.
    #[must_use]
    pub fn through_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Set the working directory for the process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn uses_shell(&self) -> bool {
        self.shell
    }

    /// The program and arguments escaped into a single shell command line.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| shell_escape::escape(Cow::Borrowed(part.as_str())))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_command(&self) -> Command {
        let mut cmd = if self.shell {
            shell_command(&self.command_line())
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args);
            cmd
        };

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Lead a fresh process group so a timeout reaches everything the
        // shell started, not only the shell itself.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(not(unix))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

/// Everything a finished process produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    /// Returns true if the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Callback receiving decoded output text as it is read.
pub type OutputCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Optional callbacks for live process output.
///
/// Text is delivered exactly as read from the pipe; callers must not assume
/// it is aligned to line boundaries.
#[derive(Default)]
pub struct OutputSinks<'a> {
    stdout: Option<OutputCallback<'a>>,
    stderr: Option<OutputCallback<'a>>,
    merged: Option<OutputCallback<'a>>,
}

impl<'a> OutputSinks<'a> {
    /// No callbacks; output is only accumulated.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Forward stdout text to `callback`.
    #[must_use]
    pub fn stdout(mut self, callback: OutputCallback<'a>) -> Self {
        self.stdout = Some(callback);
        self
    }

    /// Forward stderr text to `callback`.
    #[must_use]
    pub fn stderr(mut self, callback: OutputCallback<'a>) -> Self {
        self.stderr = Some(callback);
        self
    }

    /// Forward both pipes to one callback. Takes precedence over the
    /// per-pipe callbacks.
    #[must_use]
    pub fn merged(callback: OutputCallback<'a>) -> Self {
        Self {
            merged: Some(callback),
            ..Self::default()
        }
    }

    fn for_stdout(&mut self) -> Option<&mut (dyn FnMut(&str) + Send + 'a)> {
        match self.merged {
            Some(ref mut merged) => Some(&mut **merged),
            None => self.stdout.as_deref_mut(),
        }
    }

    fn for_stderr(&mut self) -> Option<&mut (dyn FnMut(&str) + Send + 'a)> {
        match self.merged {
            Some(ref mut merged) => Some(&mut **merged),
            None => self.stderr.as_deref_mut(),
        }
    }
}

/// Accumulates one pipe's output, decoding UTF-8 across read boundaries.
#[derive(Debug, Default)]
struct PipeText {
    text: String,
    pending: Vec<u8>,
}

impl PipeText {
    fn push(&mut self, bytes: &[u8], sink: Option<&mut (dyn FnMut(&str) + Send + '_)>) {
        self.pending.extend_from_slice(bytes);
        let decoded = decode_complete(&mut self.pending);
        self.emit(&decoded, sink);
    }

    /// Flush bytes left over from an incomplete sequence at end of stream.
    fn finish(&mut self, sink: Option<&mut (dyn FnMut(&str) + Send + '_)>) {
        if self.pending.is_empty() {
            return;
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.emit(&tail, sink);
    }

    fn emit(&mut self, decoded: &str, sink: Option<&mut (dyn FnMut(&str) + Send + '_)>) {
        if decoded.is_empty() {
            return;
        }
        self.text.push_str(decoded);
        if let Some(sink) = sink {
            sink(decoded);
        }
    }
}

/// Decode the longest complete UTF-8 prefix of `pending`, leaving an
/// incomplete trailing sequence in place. Invalid bytes become U+FFFD.
fn decode_complete(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        let (valid, invalid) = match std::str::from_utf8(pending) {
            Ok(_) => (pending.len(), None),
            Err(e) => (e.valid_up_to(), Some(e.error_len())),
        };
        out.push_str(&String::from_utf8_lossy(&pending[..valid]));
        match invalid {
            None => {
                pending.clear();
                return out;
            }
            Some(None) => {
                pending.drain(..valid);
                return out;
            }
            Some(Some(len)) => {
                out.push(char::REPLACEMENT_CHARACTER);
                pending.drain(..valid + len);
            }
        }
    }
}

/// Run `invocation` to completion.
///
/// Output is accumulated and forwarded to `sinks` as it is read. A non-zero
/// exit is not an error at this layer.
///
/// # Errors
///
/// Returns `ProcessError::Spawn` if the process cannot be started,
/// `ProcessError::TimedOut` if the deadline fires first (the process group is
/// terminated and any accumulated output is discarded), or
/// `ProcessError::Io` if reading a pipe fails.
pub async fn run_process(
    invocation: &ProcessInvocation,
    sinks: OutputSinks<'_>,
) -> Result<ProcessResult, ProcessError> {
    let span = tracing::debug_span!(
        "process",
        id = %Uuid::new_v4(),
        program = %invocation.program,
    );
    run_process_inner(invocation, sinks).instrument(span).await
}

async fn run_process_inner(
    invocation: &ProcessInvocation,
    mut sinks: OutputSinks<'_>,
) -> Result<ProcessResult, ProcessError> {
    tracing::debug!(
        args = invocation.args.len(),
        shell = invocation.shell,
        timeout_ms = u64::try_from(invocation.timeout.as_millis()).unwrap_or(u64::MAX),
        "Spawning process"
    );

    let mut child = invocation
        .build_command()
        .spawn()
        .map_err(|e| SpawnError::from_io(e, &invocation.program))?;

    match collect_output(&mut child, invocation.timeout, &mut sinks).await {
        Ok(result) => {
            tracing::debug!(
                exit_code = result.exit_code,
                stdout_len = result.stdout.len(),
                stderr_len = result.stderr.len(),
                "Process exited"
            );
            Ok(result)
        }
        Err(err) => {
            if matches!(err, ProcessError::TimedOut(_)) {
                tracing::warn!(timeout = ?invocation.timeout, "Process timed out, terminating");
            }
            terminate(&mut child, DEFAULT_TERMINATE_GRACE).await;
            Err(err)
        }
    }
}

async fn collect_output(
    child: &mut Child,
    timeout: Duration,
    sinks: &mut OutputSinks<'_>,
) -> Result<ProcessResult, ProcessError> {
    let mut stdout = child.stdout.take().ok_or(ProcessError::MissingPipe("stdout"))?;
    let mut stderr = child.stderr.take().ok_or(ProcessError::MissingPipe("stderr"))?;

    let mut out = PipeText::default();
    let mut err = PipeText::default();
    let mut out_buf = vec![0u8; READ_BUFFER_SIZE];
    let mut err_buf = vec![0u8; READ_BUFFER_SIZE];
    let mut out_open = true;
    let mut err_open = true;

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let status = loop {
        tokio::select! {
            biased;

            () = &mut deadline => return Err(ProcessError::TimedOut(timeout)),
            read = stdout.read(&mut out_buf), if out_open => {
                let n = read?;
                if n == 0 {
                    out_open = false;
                    out.finish(sinks.for_stdout());
                } else {
                    out.push(&out_buf[..n], sinks.for_stdout());
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                let n = read?;
                if n == 0 {
                    err_open = false;
                    err.finish(sinks.for_stderr());
                } else {
                    err.push(&err_buf[..n], sinks.for_stderr());
                }
            }
            status = child.wait(), if !out_open && !err_open => break status?,
        }
    };

    Ok(ProcessResult {
        exit_code: status.code().unwrap_or(UNKNOWN_EXIT_CODE),
        stdout: out.text,
        stderr: err.text,
    })
}

/// Terminate the child and its process group.
///
/// On Unix, sends SIGTERM to the group first, then SIGKILL after `grace`.
/// On other platforms, falls back to immediate kill. The child is always
/// reaped before returning.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            signal_group(pid, nix::sys::signal::Signal::SIGTERM);
            let exited = tokio::time::timeout(grace, child.wait()).await.is_ok();
            // The group outlives its leader while any member is alive, so
            // the id cannot have been reused yet.
            signal_group(pid, nix::sys::signal::Signal::SIGKILL);
            if exited {
                return;
            }
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Kill after timeout failed");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    if let Err(e) = killpg(pgid, signal) {
        tracing::trace!(error = %e, ?signal, "Signal to process group not delivered");
    }
}
