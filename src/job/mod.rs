// src/job/mod.rs

//! A single git invocation with captured output.
//!
//! [`GitJob`] wraps one external process. It can be launched asynchronously
//! with [`GitJob::run`] (completion observed through the job's event
//! channel) or synchronously with [`GitJob::run_blocking`], which suspends
//! the caller until the process exits and hands back the captured output.
//! Both entry points share the same launch/capture path.
//!
//! A job may be re-launched after completion; doing so resets the captured
//! output to "not available" until the new invocation finishes.

pub mod output;
pub mod version;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::errors::{GitqueueError, Result};
pub use output::Output;
pub use version::GitVersion;

const DEFAULT_EXECUTABLE: &str = "git";

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a job's process.
///
/// `Completed -> Running` is a valid transition: a finished job can be
/// launched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Caller-facing notifications emitted by a job.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The OS confirmed the process launched.
    Started,
    /// More stdout data is available; forwarded, not interpreted.
    StdoutReady,
    /// More stderr data is available; forwarded, not interpreted.
    StderrReady,
    /// The process could not start or errored at runtime.
    Error(String),
    /// The process exited; captured output is now retrievable.
    ///
    /// By git's own convention exit code 0 puts the result on stdout and a
    /// nonzero code puts diagnostics on stderr; nothing here enforces that.
    Finished { exit_code: i32 },
}

/// Queue-facing completion signal, delivered after the job's own completion
/// handling. Consumed by [`crate::queue::JobQueue`] to auto-advance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Executed {
    pub(crate) job_id: u64,
    pub(crate) exit_code: i32,
}

/// Default invocation a job falls back to when `run` is called without
/// explicit arguments. Fixed at construction: a preset cannot change between
/// enqueueing a job and the queue launching it.
#[derive(Debug, Clone)]
pub struct Preset {
    pub args: Vec<String>,
    pub binary: bool,
}

impl Preset {
    /// Preset capturing UTF-8 decoded lines.
    pub fn text(args: Vec<String>) -> Self {
        Self {
            args,
            binary: false,
        }
    }

    /// Preset capturing raw bytes.
    pub fn binary(args: Vec<String>) -> Self {
        Self { args, binary: true }
    }
}

/// Handle to one git invocation. Cheap to clone; clones share the same
/// underlying job.
#[derive(Clone)]
pub struct GitJob {
    shared: Arc<JobShared>,
}

struct JobShared {
    id: u64,
    executable: String,
    working_dir: PathBuf,
    preset: Option<Preset>,
    events: broadcast::Sender<JobEvent>,
    inner: Mutex<JobInner>,
}

#[derive(Default)]
struct JobInner {
    state: JobState,
    stdout: Option<Output>,
    stderr: Option<Output>,
    exit_code: Option<i32>,
    version: Option<GitVersion>,
    cancel: Option<oneshot::Sender<()>>,
    executed_hook: Option<mpsc::UnboundedSender<Executed>>,
}

impl JobShared {
    fn lock(&self) -> MutexGuard<'_, JobInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for GitJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitJob")
            .field("id", &self.shared.id)
            .field("executable", &self.shared.executable)
            .field("working_dir", &self.shared.working_dir)
            .finish_non_exhaustive()
    }
}

impl GitJob {
    /// Job invoking the default `git` executable in `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::assemble(DEFAULT_EXECUTABLE.to_string(), working_dir.into(), None)
    }

    /// Job invoking a specific executable (from configuration, or a stand-in
    /// for tests) in `working_dir`.
    pub fn with_executable(
        executable: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::assemble(executable.into(), working_dir.into(), None)
    }

    /// Job with preset arguments, invoking the default `git` executable.
    pub fn with_preset(working_dir: impl Into<PathBuf>, preset: Preset) -> Self {
        Self::assemble(DEFAULT_EXECUTABLE.to_string(), working_dir.into(), Some(preset))
    }

    /// Job with preset arguments and a specific executable.
    pub fn with_executable_and_preset(
        executable: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        preset: Preset,
    ) -> Self {
        Self::assemble(executable.into(), working_dir.into(), Some(preset))
    }

    fn assemble(executable: String, working_dir: PathBuf, preset: Option<Preset>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(JobShared {
                id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
                executable,
                working_dir,
                preset,
                events,
                inner: Mutex::new(JobInner::default()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn working_dir(&self) -> &Path {
        &self.shared.working_dir
    }

    /// Subscribe to this job's notifications. Subscribers only see events
    /// emitted after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.shared.events.subscribe()
    }

    /// Asynchronously run the command; control returns once the process has
    /// launched. Completion is observed through [`GitJob::subscribe`].
    ///
    /// With `args == None` the preset supplies both the arguments and the
    /// capture mode (`binary` is then ignored); without either, this fails
    /// immediately with [`GitqueueError::MissingArgs`].
    pub fn run(&self, args: Option<Vec<String>>, binary: bool) -> Result<()> {
        let (args, binary) = self.resolve(args, binary)?;
        self.start_process(args, binary)
    }

    /// Synchronously run the command: identical launch/capture path as
    /// [`GitJob::run`], but suspends the caller until the process exits.
    ///
    /// Returns `(stdout, stderr)`; both stay retrievable through the
    /// accessors afterwards.
    pub async fn run_blocking(
        &self,
        args: Option<Vec<String>>,
        binary: bool,
    ) -> Result<(Output, Output)> {
        // Subscribe before launching so the completion event cannot be missed.
        let mut events = self.subscribe();
        self.run(args, binary)?;

        loop {
            match events.recv().await {
                Ok(JobEvent::Finished { .. }) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Readiness events overflowed the channel; fall back to
                    // polling the state.
                    if !self.is_running() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        let inner = self.shared.lock();
        match (inner.stdout.clone(), inner.stderr.clone()) {
            (Some(stdout), Some(stderr)) => Ok((stdout, stderr)),
            _ => Err(GitqueueError::OutputUnavailable),
        }
    }

    /// Whether the underlying process is currently active.
    pub fn is_running(&self) -> bool {
        self.shared.lock().state == JobState::Running
    }

    pub fn state(&self) -> JobState {
        self.shared.lock().state
    }

    /// Kill the process if it is running; a no-op otherwise. Safe to call
    /// repeatedly. The killed process still routes through the normal
    /// completion path, recording whatever output was available.
    pub fn kill(&self) {
        let cancel = self.shared.lock().cancel.take();
        if let Some(cancel) = cancel {
            if cancel.send(()).is_err() {
                debug!(job_id = self.shared.id, "process already finished while killing");
            }
        }
    }

    /// Captured stdout of the last completed invocation, or `None` while no
    /// completed capture is available.
    pub fn stdout(&self) -> Option<Output> {
        self.shared.lock().stdout.clone()
    }

    /// Captured stderr of the last completed invocation, or `None` while no
    /// completed capture is available.
    pub fn stderr(&self) -> Option<Output> {
        self.shared.lock().stderr.clone()
    }

    /// Exit code of the last completed invocation.
    pub fn exit_code(&self) -> Option<i32> {
        self.shared.lock().exit_code
    }

    /// Version triple of the git executable, queried once and cached.
    ///
    /// On a cache miss this synchronously runs `--version` and parses the
    /// leading `git version X.Y.Z` pattern off the first output line.
    /// Unexpected output leaves the cache unset and returns `None`; a later
    /// call queries again. The executable's version is assumed stable for
    /// the caller's lifetime, so there is no invalidation.
    pub async fn version(&self) -> Option<GitVersion> {
        if let Some(version) = self.shared.lock().version {
            return Some(version);
        }

        let args = vec!["--version".to_string()];
        let (stdout, _stderr) = match self.run_blocking(Some(args), false).await {
            Ok(captured) => captured,
            Err(err) => {
                warn!(job_id = self.shared.id, error = %err, "git version query failed");
                return None;
            }
        };

        let first_line = stdout.lines().and_then(|lines| lines.first().cloned());
        let version = first_line.as_deref().and_then(version::parse_git_version);
        match version {
            Some(version) => {
                self.shared.lock().version = Some(version);
            }
            None => {
                warn!(
                    job_id = self.shared.id,
                    line = first_line.as_deref().unwrap_or(""),
                    "unexpected git --version output"
                );
            }
        }
        version
    }

    /// Install the queue's completion hook. Owned by the queue: callers must
    /// not touch a job's hook once the job has been handed to a queue.
    pub(crate) fn set_executed_hook(&self, hook: mpsc::UnboundedSender<Executed>) {
        self.shared.lock().executed_hook = Some(hook);
    }

    /// Detach the queue's completion hook; later completions are no longer
    /// reported to the queue.
    pub(crate) fn clear_executed_hook(&self) {
        self.shared.lock().executed_hook = None;
    }

    fn resolve(&self, args: Option<Vec<String>>, binary: bool) -> Result<(Vec<String>, bool)> {
        match args {
            Some(args) => Ok((args, binary)),
            None => match &self.shared.preset {
                Some(preset) => Ok((preset.args.clone(), preset.binary)),
                None => Err(GitqueueError::MissingArgs),
            },
        }
    }

    fn start_process(&self, args: Vec<String>, binary: bool) -> Result<()> {
        {
            let mut inner = self.shared.lock();
            if inner.state == JobState::Running {
                return Err(GitqueueError::AlreadyRunning);
            }
            inner.stdout = None;
            inner.stderr = None;
            inner.exit_code = None;
        }

        debug!(
            job_id = self.shared.id,
            executable = %self.shared.executable,
            ?args,
            "launching process"
        );

        let mut command = Command::new(&self.shared.executable);
        command
            .args(&args)
            .current_dir(&self.shared.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!(
                    job_id = self.shared.id,
                    executable = %self.shared.executable,
                    error = %err,
                    "failed to launch process"
                );
                let _ = self.shared.events.send(JobEvent::Error(err.to_string()));
                return Err(GitqueueError::Launch {
                    executable: self.shared.executable.clone(),
                    source: err,
                });
            }
        };

        let stdout_task = child
            .stdout
            .take()
            .map(|pipe| capture_stream(pipe, self.shared.events.clone(), JobEvent::StdoutReady));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| capture_stream(pipe, self.shared.events.clone(), JobEvent::StderrReady));

        let (cancel_tx, cancel_rx) = oneshot::channel();

        {
            let mut inner = self.shared.lock();
            inner.state = JobState::Running;
            inner.cancel = Some(cancel_tx);
        }

        let _ = self.shared.events.send(JobEvent::Started);

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            supervise(shared, child, stdout_task, stderr_task, cancel_rx, binary).await;
        });

        Ok(())
    }
}

/// Drain one process pipe into a buffer, forwarding a readiness event for
/// every chunk read.
fn capture_stream<R>(
    mut stream: R,
    events: broadcast::Sender<JobEvent>,
    ready: JobEvent,
) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut captured = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    captured.extend_from_slice(&chunk[..n]);
                    let _ = events.send(ready.clone());
                }
                Err(err) => {
                    debug!(error = %err, "stopped reading process stream");
                    break;
                }
            }
        }
        captured
    })
}

/// Wait for the child to exit (or for a kill request), then run completion
/// handling: capture both channels, record the exit code, flip the state and
/// emit `Finished` followed by the queue-facing `Executed` signal.
async fn supervise(
    shared: Arc<JobShared>,
    mut child: Child,
    stdout_task: Option<JoinHandle<Vec<u8>>>,
    stderr_task: Option<JoinHandle<Vec<u8>>>,
    mut cancel_rx: oneshot::Receiver<()>,
    binary: bool,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        recv = &mut cancel_rx => match recv {
            Ok(()) => {
                debug!(job_id = shared.id, "kill requested; terminating process");
                if let Err(err) = child.kill().await {
                    debug!(job_id = shared.id, error = %err, "process already gone on kill");
                }
                child.wait().await
            }
            // Cancel sender dropped without an explicit kill; keep waiting.
            Err(_) => child.wait().await,
        },
    };

    let stdout_bytes = match stdout_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };
    let stderr_bytes = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => Vec::new(),
    };

    let exit_code = match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(err) => {
            error!(job_id = shared.id, error = %err, "failed waiting for process");
            let _ = shared.events.send(JobEvent::Error(err.to_string()));
            -1
        }
    };

    let hook = {
        let mut inner = shared.lock();
        inner.stdout = Some(Output::capture(stdout_bytes, binary));
        inner.stderr = Some(Output::capture(stderr_bytes, binary));
        inner.exit_code = Some(exit_code);
        inner.state = JobState::Completed;
        inner.cancel = None;
        inner.executed_hook.clone()
    };

    debug!(job_id = shared.id, exit_code, "process finished");
    let _ = shared.events.send(JobEvent::Finished { exit_code });

    if let Some(hook) = hook {
        let _ = hook.send(Executed {
            job_id: shared.id,
            exit_code,
        });
    }
}
