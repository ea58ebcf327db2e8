//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`jobs`] - Fetch tool processes and their progress handles
//! - [`control`] - Job submission, cancellation and URL validation
//! - [`files`] - Storage root operations with event emission
//! - [`lifecycle`] - Shutdown coordination

mod control;
mod files;
pub mod jobs;
mod lifecycle;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use jobs::{JobHandle, JobRunner};

use crate::config::Config;
use crate::error::Result;
use crate::store::FileStore;
use crate::validator::{CliMetadataProbe, MetadataProbe, UrlValidator};

/// Main downloader instance (cloneable - all fields are Arc-wrapped or cheap to clone)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<crate::types::Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// Storage root manager
    pub(crate) store: FileStore,
    /// Two-stage URL validator
    pub(crate) validator: UrlValidator,
    /// Fetch tool process launcher and active-job registry
    pub(crate) jobs: JobRunner,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// This initializes all core components:
    /// - Creates the storage root if it does not exist
    /// - Resolves the fetch tool binary
    /// - Sets up the event broadcast channel
    pub async fn new(config: Config) -> Result<Self> {
        let binary = config.tools.resolve_binary();
        let probe: std::sync::Arc<dyn MetadataProbe> = std::sync::Arc::new(
            CliMetadataProbe::new(binary.clone(), config.tools.extra_args.clone()),
        );

        Self::build(config, binary, probe).await
    }

    /// Create a MediaDownloader with a custom metadata probe for URL validation
    ///
    /// Jobs still launch the configured binary; only validation goes through `probe`.
    pub async fn with_probe(
        config: Config,
        probe: std::sync::Arc<dyn MetadataProbe>,
    ) -> Result<Self> {
        let binary = config.tools.resolve_binary();
        Self::build(config, binary, probe).await
    }

    async fn build(
        config: Config,
        binary: std::path::PathBuf,
        probe: std::sync::Arc<dyn MetadataProbe>,
    ) -> Result<Self> {
        let store = FileStore::new(config.storage_dir().clone());
        store.ensure_root().await?;

        // Create broadcast channel with buffer size of 1000 events
        // This allows multiple subscribers to receive all events independently
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(
            binary = %binary.display(),
            probe = probe.name(),
            storage_dir = %config.storage_dir().display(),
            "fetch tool initialized"
        );

        let jobs = JobRunner::new(
            config.storage_dir().clone(),
            binary,
            config.tools.extra_args.clone(),
            event_tx.clone(),
        );
        let validator = UrlValidator::new(probe, config.tools.validation_timeout);

        Ok(Self {
            event_tx,
            config: std::sync::Arc::new(config),
            store,
            validator,
            jobs,
            accepting_new: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true)),
        })
    }

    /// Subscribe to lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than 1000 events,
    /// it will receive a `RecvError::Lagged` error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{Config, MediaDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default()).await?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "media event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::types::Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> std::sync::Arc<Config> {
        std::sync::Arc::clone(&self.config)
    }

    /// Storage root manager
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: crate::types::Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on the configured bind address (default: 0.0.0.0:8000).
    pub fn spawn_api_server(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
