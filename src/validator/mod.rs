//! URL validation
//!
//! Validation runs in two stages:
//!
//! 1. A cheap syntactic check against an HTTP/HTTPS URL grammar. Rejected URLs
//!    never reach the external tool.
//! 2. A metadata probe through a [`MetadataProbe`] implementation, bounded by a
//!    wall-clock timeout. The probe extracts the title without downloading media.
//!
//! Validation is read-only: it creates no files and no jobs.

use crate::types::ValidationResult;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub mod cli;
pub mod traits;

pub use cli::CliMetadataProbe;
pub use traits::{MetadataProbe, ProbeOutput};

/// Error reported for URLs that fail the syntactic check
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid URL format";
/// Error reported when the probe exceeds its time bound
pub const TIMEOUT_MESSAGE: &str = "Validation timeout - please try again";
/// Error reported when the probe fails without diagnostics
pub const NO_INFO_MESSAGE: &str = "Unable to extract video info";

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?",
        r"|localhost",
        r"|[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})",
        r"(?::[0-9]+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("URL pattern is valid")
});

/// Syntactic HTTP/HTTPS URL check
///
/// Accepts a domain name, `localhost` or a dotted-quad IPv4 host, an optional
/// port, and an optional path or query without whitespace.
pub fn is_valid_url_syntax(url: &str) -> bool {
    URL_PATTERN.is_match(url)
}

/// Two-stage URL validator
#[derive(Clone)]
pub struct UrlValidator {
    probe: Arc<dyn MetadataProbe>,
    timeout: Duration,
}

impl UrlValidator {
    /// Create a validator using `probe` with the given time bound
    pub fn new(probe: Arc<dyn MetadataProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    /// Time bound applied to each probe
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate `url`
    ///
    /// Never fails: every outcome, including probe errors and timeouts, is
    /// reported through [`ValidationResult`].
    pub async fn validate(&self, url: &str) -> ValidationResult {
        if !is_valid_url_syntax(url) {
            tracing::debug!(url, "rejected URL by syntax");
            return ValidationResult::invalid(INVALID_FORMAT_MESSAGE);
        }

        // Dropping the probe future on timeout is what terminates the probe process
        match tokio::time::timeout(self.timeout, self.probe.probe(url)).await {
            Ok(Ok(output)) => {
                let title = output
                    .stdout
                    .trim()
                    .lines()
                    .next()
                    .map(str::trim)
                    .unwrap_or_default();

                if output.success && !title.is_empty() {
                    tracing::debug!(url, title, "URL validated");
                    ValidationResult::valid(title)
                } else {
                    let stderr = output.stderr.trim();
                    tracing::debug!(url, success = output.success, "probe rejected URL");
                    if stderr.is_empty() {
                        ValidationResult::invalid(NO_INFO_MESSAGE)
                    } else {
                        ValidationResult::invalid(stderr)
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(url, probe = self.probe.name(), error = %e, "probe invocation failed");
                ValidationResult::invalid(e.to_string())
            }
            Err(_) => {
                tracing::warn!(url, timeout = ?self.timeout, "probe timed out");
                ValidationResult::invalid(TIMEOUT_MESSAGE)
            }
        }
    }
}
