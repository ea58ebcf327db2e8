//! Job submission handlers: blocking form post, live progress stream, URL validation.

use super::{DownloadRequest, ValidateUrlRequest};
use crate::api::AppState;
use crate::types::ValidationResult;
use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event as SseEvent, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// Where form submissions land after the job finishes
const FILES_PATH: &str = "/files";

/// Error text for requests without a URL
const NO_URL_MESSAGE: &str = "No URL provided";

/// POST /download - Submit a download from an HTML form and wait for it to finish
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body(content = DownloadRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Job finished (or no URL given); redirect to the file listing"),
        (status = 503, description = "Fetch tool could not be started or server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_download(
    State(state): State<AppState>,
    Form(request): Form<DownloadRequest>,
) -> Response {
    let Some(url) = request.url() else {
        tracing::debug!("form submission without URL");
        return Redirect::to(FILES_PATH).into_response();
    };

    match state
        .downloader
        .run_to_completion(url, request.format)
        .await
    {
        Ok(status) => {
            tracing::info!(url, state = %status.state, "form download finished");
            Redirect::to(FILES_PATH).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /download_with_progress - Start a download and stream its progress
///
/// Each frame is `data: <percent>` and the final frame is `data: complete`.
/// Disconnecting cancels the download.
#[utoipa::path(
    post,
    path = "/download_with_progress",
    tag = "downloads",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Progress stream (text/event-stream)", content_type = "text/event-stream"),
        (status = 400, description = "No URL provided"),
        (status = 503, description = "Fetch tool could not be started or server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn download_with_progress(
    State(state): State<AppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected progress request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": rejection.body_text()})),
            )
                .into_response();
        }
    };

    let Some(url) = request.url() else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": NO_URL_MESSAGE}))).into_response();
    };

    let handle = match state.downloader.start_job(url, request.format).await {
        Ok(handle) => handle,
        Err(e) => return e.into_response(),
    };

    // The stream owns the handle; dropping the response body cancels the job
    let frames = handle.map(|event| Ok::<_, Infallible>(SseEvent::default().data(event.payload())));

    Sse::new(frames).into_response()
}

/// POST /validate_url - Check that a URL is well-formed and fetchable
#[utoipa::path(
    post,
    path = "/validate_url",
    tag = "downloads",
    request_body = ValidateUrlRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidationResult),
        (status = 400, description = "No URL provided", body = ValidationResult)
    )
)]
pub async fn validate_url(
    State(state): State<AppState>,
    body: Result<Json<ValidateUrlRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected validation request body");
            ValidateUrlRequest::default()
        }
    };

    let Some(url) = request.url() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidationResult::invalid(NO_URL_MESSAGE)),
        )
            .into_response();
    };

    let result = state.downloader.validate_url(url).await;
    (StatusCode::OK, Json(result)).into_response()
}
