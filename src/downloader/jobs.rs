//! Fetch jobs: one external tool process per accepted request.
//!
//! [`JobRunner::start`] spawns the tool and hands back a [`JobHandle`]. A
//! supervising task owns the child process, reads its merged output, and
//! forwards decoded [`ProgressEvent`]s over a bounded channel. Dropping the
//! handle cancels the job: the supervisor stops reading, kills the child and
//! reaps it.

use crate::error::{Error, Result};
use crate::format::FormatSelector;
use crate::progress::{ProgressDecoder, ProgressEvent};
use crate::types::{Event, JobId, JobState, JobStatus};
use futures::Stream;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Output template handed to the tool, relative to the storage root
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Progress events buffered between the supervisor and the consumer
const PROGRESS_BUFFER: usize = 64;

/// Registry entry for a job that has not reached a terminal state
#[derive(Debug, Clone)]
pub(crate) struct ActiveJob {
    pub(crate) url: String,
    pub(crate) cancel: CancellationToken,
}

/// Map of active jobs to their cancellation tokens (used for shutdown)
pub(crate) type ActiveJobs = Arc<Mutex<HashMap<JobId, ActiveJob>>>;

/// Launches fetch tool processes
#[derive(Clone)]
pub struct JobRunner {
    storage_dir: PathBuf,
    binary: PathBuf,
    extra_args: Arc<Vec<String>>,
    event_tx: broadcast::Sender<Event>,
    /// Parent of every job token; cancelled once at shutdown
    shutdown: CancellationToken,
    pub(crate) active: ActiveJobs,
    next_id: Arc<AtomicU64>,
}

impl JobRunner {
    /// Create a runner writing into `storage_dir` with the given tool invocation
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        binary: impl Into<PathBuf>,
        extra_args: Vec<String>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            binary: binary.into(),
            extra_args: Arc::new(extra_args),
            event_tx,
            shutdown: CancellationToken::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Executable launched for each job
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Number of jobs that have not reached a terminal state
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Refuse new jobs and cancel every running one
    pub(crate) async fn cancel_all(&self) {
        self.shutdown.cancel();

        let active = self.active.lock().await;
        tracing::debug!(active_count = active.len(), "cancelling all active jobs");
        for (id, job) in active.iter() {
            tracing::debug!(job_id = %id, "signalling job cancellation");
            job.cancel.cancel();
        }
    }

    /// Cancel a single job by ID
    ///
    /// Returns `false` if the job is unknown or already terminal.
    pub async fn cancel(&self, id: JobId) -> bool {
        match self.active.lock().await.get(&id) {
            Some(job) => {
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Build the tool invocation for one job
    fn command(&self, url: &str, format: FormatSelector) -> Command {
        let template = self.storage_dir.join(OUTPUT_TEMPLATE);

        let mut cmd = Command::new(&self.binary);
        cmd.args(self.extra_args.iter())
            .arg("-f")
            .arg(format.expression())
            .arg("-o")
            .arg(template)
            .arg("--newline")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the tool for `url` and return a handle streaming its progress
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once shutdown has begun
    /// - [`Error::ExternalTool`] if the process cannot be spawned
    pub async fn start(&self, url: &str, format: FormatSelector) -> Result<JobHandle> {
        if self.shutdown.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let cancel = self.shutdown.child_token();
        let (status_tx, status_rx) = watch::channel(JobStatus::default());

        {
            let active = self.active.lock().await;
            if let Some((other, _)) = active.iter().find(|(_, job)| job.url == url) {
                tracing::warn!(
                    job_id = %id,
                    other_job_id = %other,
                    url,
                    "another job for this URL is running; output files may collide"
                );
            }
        }

        let mut child = self.command(url, format).spawn().map_err(|e| {
            tracing::error!(job_id = %id, url, binary = %self.binary.display(), error = %e, "failed to spawn fetch tool");
            Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            // Both pipes are requested in command(); kill_on_drop reaps the child
            return Err(Error::ExternalTool("fetch tool output was not captured".into()));
        };

        let pid = child.id();
        status_tx.send_modify(|s| s.state = JobState::Running);

        self.active.lock().await.insert(
            id,
            ActiveJob {
                url: url.to_string(),
                cancel: cancel.clone(),
            },
        );

        tracing::info!(job_id = %id, url, %format, pid = ?pid, "job started");
        self.event_tx
            .send(Event::JobStarted {
                id,
                url: url.to_string(),
                format,
            })
            .ok();

        let lines: OutputLines = Box::pin(
            SplitStream::new(BufReader::new(stdout).split(b'\n'))
                .merge(SplitStream::new(BufReader::new(stderr).split(b'\n'))),
        );
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);

        tokio::spawn(supervise(Supervised {
            id,
            child,
            lines,
            progress_tx,
            status_tx,
            cancel: cancel.clone(),
            event_tx: self.event_tx.clone(),
            active: self.active.clone(),
        }));

        Ok(JobHandle {
            id,
            url: url.to_string(),
            format,
            pid,
            progress: progress_rx,
            status: status_rx,
            cancel: cancel.clone(),
            _cancel_on_drop: cancel.drop_guard(),
        })
    }
}

type OutputLines = Pin<Box<dyn Stream<Item = std::io::Result<Vec<u8>>> + Send>>;

/// Everything the supervising task owns for one job
struct Supervised {
    id: JobId,
    child: Child,
    lines: OutputLines,
    progress_tx: mpsc::Sender<ProgressEvent>,
    status_tx: watch::Sender<JobStatus>,
    cancel: CancellationToken,
    event_tx: broadcast::Sender<Event>,
    active: ActiveJobs,
}

enum Outcome {
    Exited(ExitStatus),
    WaitFailed(std::io::Error),
    Cancelled,
}

async fn supervise(job: Supervised) {
    let Supervised {
        id,
        mut child,
        mut lines,
        progress_tx,
        status_tx,
        cancel,
        event_tx,
        active,
    } = job;

    let mut decoder = ProgressDecoder::new();

    let outcome = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Outcome::Cancelled,
            next = lines.next() => next,
        };

        match next {
            Some(Ok(raw)) => {
                let text = String::from_utf8_lossy(&raw);
                let line = text.trim_end_matches('\r');
                tracing::trace!(job_id = %id, line, "tool output");

                let Some(event) = decoder.decode_line(line) else {
                    continue;
                };

                if let Some(percent) = event.percent() {
                    status_tx.send_modify(|s| s.progress_percent = percent);
                    event_tx.send(Event::JobProgress { id, percent }).ok();
                }

                let delivered = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    sent = progress_tx.send(event) => sent.is_ok(),
                };
                if !delivered {
                    break Outcome::Cancelled;
                }
            }
            Some(Err(e)) => {
                tracing::warn!(job_id = %id, error = %e, "failed to read tool output");
                break wait_for_exit(&mut child, &cancel).await;
            }
            None => break wait_for_exit(&mut child, &cancel).await,
        }
    };

    match outcome {
        Outcome::Cancelled => {
            if let Err(e) = child.start_kill() {
                tracing::debug!(job_id = %id, error = %e, "kill failed, process already exited");
            }
            match child.wait().await {
                Ok(status) => tracing::debug!(job_id = %id, %status, "cancelled process reaped"),
                Err(e) => tracing::warn!(job_id = %id, error = %e, "failed to reap cancelled process"),
            }

            status_tx.send_modify(|s| s.state = JobState::Cancelled);
            active.lock().await.remove(&id);
            tracing::info!(job_id = %id, "job cancelled");
            event_tx.send(Event::JobCancelled { id }).ok();
        }
        Outcome::Exited(status) if status.success() => {
            status_tx.send_modify(|s| s.state = JobState::Succeeded);
            active.lock().await.remove(&id);
            tracing::info!(job_id = %id, "job succeeded");
            event_tx.send(Event::JobSucceeded { id }).ok();
            send_completed(&mut decoder, &progress_tx).await;
        }
        Outcome::Exited(status) => {
            status_tx.send_modify(|s| s.state = JobState::Failed);
            active.lock().await.remove(&id);
            tracing::warn!(job_id = %id, %status, "job failed");
            event_tx
                .send(Event::JobFailed {
                    id,
                    exit_code: status.code(),
                })
                .ok();
            send_completed(&mut decoder, &progress_tx).await;
        }
        Outcome::WaitFailed(e) => {
            status_tx.send_modify(|s| s.state = JobState::Failed);
            active.lock().await.remove(&id);
            tracing::error!(job_id = %id, error = %e, "failed to wait for fetch tool");
            event_tx.send(Event::JobFailed { id, exit_code: None }).ok();
            send_completed(&mut decoder, &progress_tx).await;
        }
    }
}

async fn wait_for_exit(child: &mut Child, cancel: &CancellationToken) -> Outcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Outcome::Cancelled,
        status = child.wait() => match status {
            Ok(status) => Outcome::Exited(status),
            Err(e) => Outcome::WaitFailed(e),
        },
    }
}

async fn send_completed(decoder: &mut ProgressDecoder, progress_tx: &mpsc::Sender<ProgressEvent>) {
    if let Some(event) = decoder.finish() {
        // The consumer may already be gone; nothing left to cancel at this point
        progress_tx.send(event).await.ok();
    }
}

/// Consumer side of a running job
///
/// Yields the job's [`ProgressEvent`]s in emission order and ends after
/// [`ProgressEvent::Completed`]. Dropping the handle cancels the job.
pub struct JobHandle {
    id: JobId,
    url: String,
    format: FormatSelector,
    pid: Option<u32>,
    progress: mpsc::Receiver<ProgressEvent>,
    status: watch::Receiver<JobStatus>,
    cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
}

impl JobHandle {
    /// Job ID
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requested format
    pub fn format(&self) -> FormatSelector {
        self.format
    }

    /// OS process ID of the tool, if it was still running when spawned
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.status.borrow().state
    }

    /// Last reported percentage
    pub fn progress(&self) -> f64 {
        self.status.borrow().progress_percent
    }

    /// Snapshot of state and progress
    pub fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    /// Request cancellation without dropping the handle
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain the job and return its terminal status
    pub async fn wait(mut self) -> JobStatus {
        while self.progress.recv().await.is_some() {}

        let terminal = self
            .status
            .wait_for(|s| s.state.is_terminal())
            .await
            .map(|status| *status);
        terminal.unwrap_or_else(|_| *self.status.borrow())
    }
}

impl Stream for JobHandle {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.progress.poll_recv(cx)
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("format", &self.format)
            .field("pid", &self.pid)
            .field("status", &*self.status.borrow())
            .finish()
    }
}
