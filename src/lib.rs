//! # media-dl
//!
//! Web front for an external media fetch tool (yt-dlp) with live progress
//! streaming and management of the downloaded files.
//!
//! ## Design Philosophy
//!
//! media-dl is designed to be:
//! - **Thin** - yt-dlp does the fetching; this crate launches it, reads its progress and serves the results
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Embeddable** - The HTTP surface is a plain axum router over a library type
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use media_dl::{Config, FormatSelector, MediaDownloader, ProgressEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     let mut job = downloader
//!         .start_job("https://example.com/watch?v=abc", FormatSelector::AudioOnly)
//!         .await?;
//!
//!     while let Some(event) = job.next().await {
//!         match event {
//!             ProgressEvent::Percent(p) => println!("{}%", p.text),
//!             ProgressEvent::Completed => println!("done"),
//!         }
//!     }
//!
//!     for file in downloader.list_files().await? {
//!         println!("{} ({} bytes)", file.name, file.size_bytes);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Format selection
pub mod format;
/// Progress line decoding
pub mod progress;
/// Storage root management
pub mod store;
/// Core types and events
pub mod types;
/// URL validation
pub mod validator;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{JobHandle, JobRunner, MediaDownloader};
pub use error::{ApiError, Error, ErrorDetail, FileFailure, Result, StoreError, ToHttpStatus};
pub use format::FormatSelector;
pub use progress::{Percentage, ProgressDecoder, ProgressEvent};
pub use store::{FileStore, ServedFile};
pub use types::{Event, JobId, JobState, JobStatus, StoredFile, ValidationResult};
pub use validator::{CliMetadataProbe, MetadataProbe, ProbeOutput, UrlValidator};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method,
/// which cancels every active job.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = MediaDownloader::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

/// Resolve once SIGTERM or SIGINT (Ctrl+C elsewhere) is received
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once Ctrl+C is received
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
