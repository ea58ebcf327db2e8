//! Probe abstraction used by URL validation

use async_trait::async_trait;

/// Raw result of one metadata probe invocation
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    /// Whether the tool exited with a success status
    pub success: bool,
    /// Captured standard output (the title, one per line)
    pub stdout: String,
    /// Captured standard error (diagnostics)
    pub stderr: String,
}

/// Trait for metadata-only probes against the fetch tool
///
/// A probe must never download media or create files. Implementations are
/// expected to stop their work when the returned future is dropped, which is
/// how the validator enforces its timeout.
///
/// # Examples
///
/// ```no_run
/// use media_dl::validator::{CliMetadataProbe, MetadataProbe};
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let probe = CliMetadataProbe::new(PathBuf::from("/usr/bin/yt-dlp"), Vec::new());
/// let output = probe.probe("https://example.com/watch?v=abc").await?;
/// println!("title: {}", output.stdout.trim());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    /// Ask the tool for the media title of `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the tool could not be invoked at all (missing binary,
    /// permission denied). A tool that runs and rejects the URL is reported through
    /// [`ProbeOutput::success`] instead.
    async fn probe(&self, url: &str) -> crate::Result<ProbeOutput>;

    /// Name of this probe implementation, for logging
    fn name(&self) -> &'static str;
}
