//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::format::FormatSelector;

/// Unique identifier for a job within the running process
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state
///
/// `Starting → Running → {Succeeded | Failed}`, with `Cancelled` reachable from
/// either non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, child process not yet spawned
    Starting,
    /// Child process spawned and its output is being read
    Running,
    /// Child process exited with a success status
    Succeeded,
    /// Child process exited with a non-success status
    Failed,
    /// Consumer went away or the server is shutting down; child killed and reaped
    Cancelled,
}

impl JobState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Starting => "starting",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Observable status of a job: its state plus the last reported percentage
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobStatus {
    /// Current state
    pub state: JobState,
    /// Last percentage reported by the tool (0.0 until the first reading)
    pub progress_percent: f64,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Starting,
            progress_percent: 0.0,
        }
    }
}

/// A completed artifact in the storage root
///
/// Metadata is read from the filesystem on each listing; nothing is cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// File name inside the storage root
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Creation time (birth time when available, otherwise modification time)
    pub created_at: DateTime<Utc>,
}

/// Outcome of URL validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationResult {
    /// Whether the URL is syntactically valid and fetchable
    pub valid: bool,
    /// Media title extracted by the probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Reason the URL was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A fetchable URL with its title
    pub fn valid(title: impl Into<String>) -> Self {
        Self {
            valid: true,
            title: Some(title.into()),
            error: None,
        }
    }

    /// A rejected URL with the reason
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            title: None,
            error: Some(error.into()),
        }
    }
}

/// Events emitted during the job and storage lifecycle
///
/// Consumers subscribe via [`MediaDownloader::subscribe()`](crate::MediaDownloader::subscribe)
/// or the `/events` SSE endpoint. Unlike the per-job progress stream, these events
/// distinguish success from failure.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Child process spawned for a job
    JobStarted {
        /// Job ID
        id: JobId,
        /// Source URL
        url: String,
        /// Requested format
        format: FormatSelector,
    },

    /// Progress reading from a running job
    JobProgress {
        /// Job ID
        id: JobId,
        /// Percentage reported by the tool
        percent: f64,
    },

    /// Tool exited successfully
    JobSucceeded {
        /// Job ID
        id: JobId,
    },

    /// Tool exited with a failure status
    JobFailed {
        /// Job ID
        id: JobId,
        /// Exit code, if the process exited normally
        exit_code: Option<i32>,
    },

    /// Job torn down before the tool exited
    JobCancelled {
        /// Job ID
        id: JobId,
    },

    /// A stored file was removed
    FileDeleted {
        /// File name
        name: String,
    },

    /// The storage root was cleared
    FilesCleared {
        /// Number of files removed
        deleted: usize,
    },

    /// Downloader is shutting down
    Shutdown,
}

impl Event {
    /// SSE event name for this variant
    pub fn kind(&self) -> &'static str {
        match self {
            Event::JobStarted { .. } => "job_started",
            Event::JobProgress { .. } => "job_progress",
            Event::JobSucceeded { .. } => "job_succeeded",
            Event::JobFailed { .. } => "job_failed",
            Event::JobCancelled { .. } => "job_cancelled",
            Event::FileDeleted { .. } => "file_deleted",
            Event::FilesCleared { .. } => "files_cleared",
            Event::Shutdown => "shutdown",
        }
    }
}
