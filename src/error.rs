//! Error types for media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (storage, external tool, configuration)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage_dir")
        key: Option<String>,
    },

    /// Malformed or incomplete client request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A file name that cannot be mapped safely into the storage root
    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName {
        /// The rejected name, as received
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// Stored file not found
    #[error("file not found: {0}")]
    NotFound(String),

    /// Storage directory error
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool execution failed (spawn failure, missing binary)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage directory errors that aggregate per-file outcomes
#[derive(Debug, Error)]
pub enum StoreError {
    /// Some files could not be removed while clearing the storage root
    #[error("deleted {deleted} file(s), failed to delete {}: {}", failures.len(), summarize(failures))]
    PartialClear {
        /// Number of files that were removed before and after the failures
        deleted: usize,
        /// One entry per file that could not be removed
        failures: Vec<FileFailure>,
    },
}

/// A single file operation that failed inside a bulk operation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileFailure {
    /// Name of the file inside the storage root
    pub name: String,
    /// Error text reported by the filesystem
    pub reason: String,
}

fn summarize(failures: &[FileFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "file not found: clip.mp4",
///     "details": {
///       "name": "clip.mp4"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_request")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,
            Error::InvalidFileName { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Store(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable
            Error::ExternalTool(_) => 503,
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::InvalidFileName { .. } => "invalid_filename",
            Error::NotFound(_) => "not_found",
            Error::Store(e) => match e {
                StoreError::PartialClear { .. } => "partial_clear",
            },
            Error::Io(_) => "io_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::ShuttingDown => "shutting_down",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::InvalidFileName { name, .. } => Some(serde_json::json!({
                "name": name,
            })),
            Error::NotFound(name) => Some(serde_json::json!({
                "name": name,
            })),
            Error::Store(StoreError::PartialClear { deleted, failures }) => {
                Some(serde_json::json!({
                    "deleted": deleted,
                    "failures": failures,
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("storage_dir".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::InvalidRequest("No URL provided".into()),
                400,
                "invalid_request",
            ),
            (
                Error::InvalidFileName {
                    name: "../etc/passwd".into(),
                    reason: "contains a path separator".into(),
                },
                400,
                "invalid_filename",
            ),
            (Error::NotFound("clip.mp4".into()), 404, "not_found"),
            (
                Error::Store(StoreError::PartialClear {
                    deleted: 2,
                    failures: vec![FileFailure {
                        name: "a.mp4".into(),
                        reason: "permission denied".into(),
                    }],
                }),
                500,
                "partial_clear",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::ExternalTool("yt-dlp not found".into()),
                503,
                "external_tool_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn partial_clear_message_lists_each_failure() {
        let error = Error::Store(StoreError::PartialClear {
            deleted: 3,
            failures: vec![
                FileFailure {
                    name: "a.mp4".into(),
                    reason: "permission denied".into(),
                },
                FileFailure {
                    name: "b.m4a".into(),
                    reason: "busy".into(),
                },
            ],
        });

        let message = error.to_string();
        assert!(message.contains("deleted 3 file(s)"));
        assert!(message.contains("failed to delete 2"));
        assert!(message.contains("a.mp4: permission denied"));
        assert!(message.contains("b.m4a: busy"));
    }

    #[test]
    fn api_error_carries_partial_clear_details() {
        let error = Error::Store(StoreError::PartialClear {
            deleted: 1,
            failures: vec![FileFailure {
                name: "a.mp4".into(),
                reason: "permission denied".into(),
            }],
        });
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "partial_clear");
        let details = api_error.error.details.unwrap();
        assert_eq!(details["deleted"], 1);
        assert_eq!(details["failures"][0]["name"], "a.mp4");
    }

    #[test]
    fn api_error_omits_details_when_absent() {
        let api_error: ApiError = Error::ShuttingDown.into();
        let json = serde_json::to_value(&api_error).unwrap();

        assert_eq!(json["error"]["code"], "shutting_down");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn invalid_filename_details_include_name() {
        let api_error: ApiError = Error::InvalidFileName {
            name: "..".into(),
            reason: "reserved name".into(),
        }
        .into();

        assert_eq!(api_error.error.details.unwrap()["name"], "..");
    }
}
