//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Job submission, live progress and URL validation
//! - [`files`] - Stored file listing, download, deletion
//! - [`system`] - Health, events, OpenAPI

use crate::format::FormatSelector;
use serde::{Deserialize, Serialize};

mod downloads;
mod files;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use downloads::*;
pub use files::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Body of POST /download (form) and POST /download_with_progress (JSON)
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Media URL to fetch
    #[serde(default)]
    pub url: Option<String>,
    /// Format selector (`m4a`/`audio` or `mp4`/`video`; anything else means video)
    #[serde(default)]
    pub format: FormatSelector,
}

impl DownloadRequest {
    /// The URL, if one was supplied and is not blank
    pub fn url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }
}

/// Body of POST /validate_url
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ValidateUrlRequest {
    /// URL to validate
    #[serde(default)]
    pub url: Option<String>,
}

impl ValidateUrlRequest {
    /// The URL, if one was supplied and is not blank
    pub fn url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }
}

/// Response of POST /clear_all
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClearAllResponse {
    /// Whether every file was removed
    pub success: bool,
    /// Summary on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of files removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
