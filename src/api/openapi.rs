//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "REST API for fetching media through yt-dlp with live progress and stored file management",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::submit_download,
        crate::api::routes::download_with_progress,
        crate::api::routes::validate_url,

        // Files
        crate::api::routes::list_files,
        crate::api::routes::download_file,
        crate::api::routes::delete_file,
        crate::api::routes::clear_all,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobState,
        crate::types::JobStatus,
        crate::types::StoredFile,
        crate::types::ValidationResult,
        crate::types::Event,
        crate::format::FormatSelector,

        // Config types from config.rs
        crate::config::Config,
        crate::config::StorageConfig,
        crate::config::ToolsConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request/response types from routes
        crate::api::routes::DownloadRequest,
        crate::api::routes::ValidateUrlRequest,
        crate::api::routes::ClearAllResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::error::FileFailure,
    )),
    tags(
        (name = "downloads", description = "Downloads - Submit jobs, stream live progress, validate URLs"),
        (name = "files", description = "Files - List, download and delete stored media"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
