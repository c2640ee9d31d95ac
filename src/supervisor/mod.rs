//! Process supervisor: runs one synthesized command line at a time.
//!
//! Supervisor::run -> spawn (stdout and stderr share one pipe) -> SupervisorEvent::Output ...
//! -> SupervisorEvent::Finished(TerminalStatus), exactly once per accepted run.
//!
//! `run` and `cancel` never block on the child; output and exit are delivered
//! through the event stream returned by [`Supervisor::new`]. Both must be
//! called from inside a Tokio runtime.

pub mod invocation;
mod merged;

pub use invocation::{Invocation, parse_invocation};

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::{EngineError, Result, SpawnError};
use crate::store::RunContext;
use merged::{MergedOutput, MergedPipe};

/// How long output still buffered in the pipe is forwarded after the process
/// exits. Bounds the wait when a background descendant keeps the pipe open.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Running,
    Finished,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Idle => "idle",
            ProcessState::Running => "running",
            ProcessState::Finished => "finished",
            ProcessState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunExit {
    /// Process exited with a code (non-zero is a normal outcome, not an error).
    Code(i32),
    /// Process was ended by a signal.
    Signal(i32),
    /// Process never started.
    SpawnFailed(SpawnError),
}

impl RunExit {
    pub fn code(&self) -> Option<i32> {
        match self {
            RunExit::Code(c) => Some(*c),
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, RunExit::Code(0))
    }

    pub fn spawn_error(&self) -> Option<&SpawnError> {
        match self {
            RunExit::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RunExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunExit::Code(c) => write!(f, "exit code {c}"),
            RunExit::Signal(s) => write!(f, "killed by signal {s}"),
            RunExit::SpawnFailed(e) => write!(f, "{e}"),
        }
    }
}

/// Final record of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalStatus {
    pub exit: RunExit,
    /// Measured from spawn; zero when the process never started.
    pub elapsed: Duration,
    /// A termination request was sent during the run.
    pub cancelled: bool,
}

impl TerminalStatus {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit.code()
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Notifications for the output sink and the status sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Output should be cleared; always precedes the run's first chunk.
    Cleared,
    /// Bytes from stdout or stderr, in the order the process wrote them.
    Output(Vec<u8>),
    /// Terminal status; nothing else follows for this run.
    Finished(TerminalStatus),
}

pub type EventStream = mpsc::UnboundedReceiver<SupervisorEvent>;

/// Snapshot of the single process slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub state: ProcessState,
    pub started_at: Option<Instant>,
    pub pid: Option<u32>,
    /// Exit of the last completed run.
    pub exit: Option<RunExit>,
    pub elapsed: Duration,
    /// Finished or Terminated, for the last completed run.
    pub last_outcome: Option<ProcessState>,
}

impl Default for ProcessHandle {
    fn default() -> Self {
        Self {
            state: ProcessState::Idle,
            started_at: None,
            pid: None,
            exit: None,
            elapsed: Duration::ZERO,
            last_outcome: None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    handle: ProcessHandle,
    cancel: Option<mpsc::UnboundedSender<()>>,
    cancel_requested: bool,
}

/// Owner of at most one running process.
#[derive(Debug, Clone)]
pub struct Supervisor {
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<SupervisorEvent>,
    kill_after: Option<Duration>,
}

impl Supervisor {
    pub fn new() -> (Self, EventStream) {
        let (events, rx) = mpsc::unbounded_channel();
        let sup = Supervisor {
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
            kill_after: None,
        };
        (sup, rx)
    }

    /// Send SIGKILL when a cancelled process is still alive after `grace`.
    pub fn with_kill_after(mut self, grace: Duration) -> Self {
        self.kill_after = Some(grace);
        self
    }

    pub fn handle(&self) -> ProcessHandle {
        self.lock().handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().handle.state == ProcessState::Running
    }

    /// Start `command_line`.
    ///
    /// Rejected synchronously with `Busy` while a run is active and with a
    /// validation error when the line has nothing to execute. A process that
    /// fails to start is reported as a `Finished` event carrying
    /// [`RunExit::SpawnFailed`]; `run` itself still returns `Ok`.
    pub fn run(&self, command_line: &str, ctx: &RunContext) -> Result<()> {
        let mut inner = self.lock();
        if inner.handle.state == ProcessState::Running {
            log::debug!("run rejected: a process is already running");
            return Err(EngineError::Busy);
        }
        let inv = parse_invocation(command_line)?;

        if ctx.clear_output_before_run {
            let _ = self.events.send(SupervisorEvent::Cleared);
        }

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .current_dir(&ctx.working_directory)
            .stdin(Stdio::null());

        let spawned = MergedPipe::open().and_then(|pipe| {
            cmd.stdout(pipe.stdout).stderr(pipe.stderr);
            cmd.spawn().map(|child| (child, pipe.output))
        });
        // The command still holds the parent's copies of the write end.
        drop(cmd);

        let (child, output) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                log::warn!("spawn failed for '{}': {e}", inv.program);
                let exit = RunExit::SpawnFailed(SpawnError {
                    program: inv.program.clone(),
                    message: e.to_string(),
                });
                inner.handle = ProcessHandle {
                    exit: Some(exit.clone()),
                    last_outcome: Some(ProcessState::Finished),
                    ..ProcessHandle::default()
                };
                drop(inner);
                let _ = self.events.send(SupervisorEvent::Finished(TerminalStatus {
                    exit,
                    elapsed: Duration::ZERO,
                    cancelled: false,
                }));
                return Ok(());
            }
        };
        let started = Instant::now();
        let pid = child.id();
        log::info!(
            "started '{}' (pid {}) in {}",
            inv,
            pid.map(|p| p.to_string()).unwrap_or_else(|| "?".into()),
            ctx.working_directory.display()
        );

        let (cancel_tx, cancel_rx) = mpsc::unbounded_channel();
        inner.handle = ProcessHandle {
            state: ProcessState::Running,
            started_at: Some(started),
            pid,
            ..ProcessHandle::default()
        };
        inner.cancel = Some(cancel_tx);
        inner.cancel_requested = false;
        drop(inner);

        tokio::spawn(pump(
            child,
            output,
            started,
            cancel_rx,
            Arc::clone(&self.inner),
            self.events.clone(),
            self.kill_after,
        ));
        Ok(())
    }

    /// Request termination of the running process.
    ///
    /// Returns whether a request was sent. A no-op (and no event) unless a run
    /// is active; the terminal status follows through the normal exit path.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.handle.state != ProcessState::Running {
            return false;
        }
        inner.cancel_requested = true;
        if let Some(tx) = &inner.cancel {
            let _ = tx.send(());
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/* ---- Run task ---- */

async fn pump(
    mut child: Child,
    output: MergedOutput,
    started: Instant,
    mut cancel_rx: mpsc::UnboundedReceiver<()>,
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<SupervisorEvent>,
    kill_after: Option<Duration>,
) {
    let pid = child.id();
    let mut output = Some(output);
    let mut kill_at: Option<tokio::time::Instant> = None;

    // Forward output until the process itself exits; the pipe may outlive it.
    let status = loop {
        tokio::select! {
            chunk = next_chunk(&mut output) => forward(chunk, &mut output, &events),
            status = child.wait() => break status,
            Some(()) = cancel_rx.recv() => {
                kill_at = request_termination(pid, kill_after);
            }
            () = escalation(kill_at) => {
                force_kill(pid);
                kill_at = None;
            }
        }
    };

    if output.is_some() {
        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            while output.is_some() {
                let chunk = next_chunk(&mut output).await;
                forward(chunk, &mut output, &events);
            }
        })
        .await;
        if drained.is_err() {
            log::debug!("output pipe still open after exit; detaching");
        }
    }
    drop(output);

    let elapsed = started.elapsed();
    let exit = match status {
        Ok(st) => exit_of(st),
        Err(e) => {
            log::error!("failed to reap child: {e}");
            RunExit::Code(-1)
        }
    };

    let cancelled = {
        let mut guard = lock(&inner);
        let cancelled = guard.cancel_requested;
        let outcome = if cancelled {
            ProcessState::Terminated
        } else {
            ProcessState::Finished
        };
        guard.handle = ProcessHandle {
            state: ProcessState::Idle,
            started_at: Some(started),
            pid: None,
            exit: Some(exit.clone()),
            elapsed,
            last_outcome: Some(outcome),
        };
        guard.cancel = None;
        guard.cancel_requested = false;
        cancelled
    };
    log::info!("process {exit} after {} ms", elapsed.as_millis());

    let _ = events.send(SupervisorEvent::Finished(TerminalStatus {
        exit,
        elapsed,
        cancelled,
    }));
}

async fn next_chunk(output: &mut Option<MergedOutput>) -> std::io::Result<Option<Vec<u8>>> {
    match output.as_mut() {
        Some(out) => out.next_chunk().await,
        None => std::future::pending().await,
    }
}

fn forward(
    chunk: std::io::Result<Option<Vec<u8>>>,
    output: &mut Option<MergedOutput>,
    events: &mpsc::UnboundedSender<SupervisorEvent>,
) {
    match chunk {
        Ok(Some(bytes)) => {
            let _ = events.send(SupervisorEvent::Output(bytes));
        }
        Ok(None) => *output = None,
        Err(e) => {
            log::warn!("output pipe error: {e}");
            *output = None;
        }
    }
}

async fn escalation(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn request_termination(
    pid: Option<u32>,
    kill_after: Option<Duration>,
) -> Option<tokio::time::Instant> {
    let pid = pid?;
    log::info!("requesting termination of pid {pid}");
    terminate(pid);
    kill_after.map(|grace| tokio::time::Instant::now() + grace)
}

#[cfg(unix)]
fn terminate(pid: u32) {
    send_signal(pid, nix::sys::signal::Signal::SIGTERM);
}

#[cfg(unix)]
fn force_kill(pid: Option<u32>) {
    if let Some(pid) = pid {
        log::warn!("pid {pid} ignored termination; sending SIGKILL");
        send_signal(pid, nix::sys::signal::Signal::SIGKILL);
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        log::warn!("failed to send {signal:?} to pid {pid}: {e}");
    }
}

#[cfg(not(unix))]
fn terminate(pid: u32) {
    log::warn!("termination of pid {pid} is not supported on this platform");
}

#[cfg(not(unix))]
fn force_kill(pid: Option<u32>) {
    let _ = pid;
}

#[cfg(unix)]
fn exit_of(status: ExitStatus) -> RunExit {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => RunExit::Code(code),
        (None, Some(sig)) => RunExit::Signal(sig),
        (None, None) => RunExit::Code(-1),
    }
}

#[cfg(not(unix))]
fn exit_of(status: ExitStatus) -> RunExit {
    RunExit::Code(status.code().unwrap_or(-1))
}
