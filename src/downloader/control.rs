//! Job control: submission, blocking runs, cancellation and URL validation.

use crate::error::{Error, Result};
use crate::format::FormatSelector;
use crate::types::{JobId, JobStatus, ValidationResult};

use super::{JobHandle, MediaDownloader};

impl MediaDownloader {
    /// Start a fetch job and return its progress handle
    ///
    /// The job runs for as long as the handle is alive. Dropping the handle
    /// (for example when an SSE client disconnects) terminates the tool process.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] if shutdown has begun
    /// - [`Error::ExternalTool`] if the tool cannot be spawned
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use media_dl::*;
    /// # use futures::StreamExt;
    /// # async fn example(downloader: MediaDownloader) -> Result<()> {
    /// let mut job = downloader
    ///     .start_job("https://example.com/watch?v=abc", FormatSelector::AudioOnly)
    ///     .await?;
    /// while let Some(event) = job.next().await {
    ///     println!("{}", event.payload());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_job(&self, url: &str, format: FormatSelector) -> Result<JobHandle> {
        if !self
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::ShuttingDown);
        }

        self.jobs.start(url, format).await
    }

    /// Run a fetch job to completion and return its terminal status
    ///
    /// The job is driven by its own task, so it keeps running to the end even if
    /// the caller's future is dropped midway.
    pub async fn run_to_completion(&self, url: &str, format: FormatSelector) -> Result<JobStatus> {
        let handle = self.start_job(url, format).await?;
        let id = handle.id();

        match tokio::spawn(handle.wait()).await {
            Ok(status) => {
                tracing::debug!(job_id = %id, state = %status.state, "blocking job finished");
                Ok(status)
            }
            Err(e) => Err(Error::Other(format!("job {} task failed: {}", id, e))),
        }
    }

    /// Cancel an active job by ID
    ///
    /// Returns `false` if no such job is running.
    pub async fn cancel_job(&self, id: JobId) -> bool {
        let cancelled = self.jobs.cancel(id).await;
        if cancelled {
            tracing::info!(job_id = %id, "job cancellation requested");
        }
        cancelled
    }

    /// Number of jobs that have not reached a terminal state
    pub async fn active_job_count(&self) -> usize {
        self.jobs.active_count().await
    }

    /// Validate a URL without downloading anything
    pub async fn validate_url(&self, url: &str) -> ValidationResult {
        self.validator.validate(url).await
    }
}
