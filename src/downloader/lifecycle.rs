//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;

use super::MediaDownloader;

/// Upper bound on how long shutdown waits for cancelled jobs to unwind
const SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs
    /// 2. Cancels all active jobs (each kills and reaps its tool process)
    /// 3. Waits for active jobs to unwind with a timeout (30 seconds)
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Calling it more than once is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new jobs
        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        // 2. Cancel all active jobs
        self.jobs.cancel_all().await;
        tracing::info!("Signaled cancellation to all active jobs");

        // 3. Wait for active jobs to unwind with timeout
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_jobs()).await {
            Ok(()) => {
                tracing::info!("All active jobs stopped");
            }
            Err(_) => {
                let remaining = self.jobs.active_count().await;
                tracing::warn!(
                    remaining,
                    "Timeout waiting for jobs to stop, proceeding with shutdown"
                );
            }
        }

        // 4. Emit shutdown event
        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new jobs are still accepted
    pub fn is_accepting_jobs(&self) -> bool {
        self.accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Poll the active-job registry until it is empty
    async fn wait_for_active_jobs(&self) {
        loop {
            let active_count = self.jobs.active_count().await;

            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active jobs to stop");
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }
}
