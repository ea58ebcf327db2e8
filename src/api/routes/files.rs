//! Stored file handlers: listing, conditional download, deletion.

use super::ClearAllResponse;
use crate::api::AppState;
use crate::error::Error;
use crate::store::ServedFile;
use crate::types::StoredFile;
use axum::{
    Json,
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// GET /files - List stored files, newest first
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    responses(
        (status = 200, description = "Stored files ordered by creation time, newest first", body = Vec<StoredFile>),
        (status = 500, description = "Storage directory could not be read", body = crate::error::ApiError)
    )
)]
pub async fn list_files(State(state): State<AppState>) -> Response {
    match state.downloader.list_files().await {
        Ok(files) => (StatusCode::OK, Json(files)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /download_file/:filename - Send a stored file as an attachment
///
/// `Range`, `If-Modified-Since` and `If-Unmodified-Since` are honoured, so
/// players can seek and browsers can resume.
#[utoipa::path(
    get,
    path = "/download_file/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range", content_type = "application/octet-stream"),
        (status = 304, description = "Not modified since the given date"),
        (status = 400, description = "Unsafe file name", body = crate::error::ApiError),
        (status = 404, description = "File not found", body = crate::error::ApiError),
        (status = 416, description = "Range not satisfiable")
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, Error> {
    let ServedFile {
        name,
        path,
        file,
        content_type,
        len,
    } = state.downloader.open_file(&filename).await?;
    drop(file);
    tracing::debug!(file = %name, len, "serving stored file");

    let mime: mime_guess::mime::Mime = content_type
        .parse()
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM);
    let disposition = HeaderValue::from_str(&content_disposition(&name))
        .map_err(|e| Error::Other(format!("invalid Content-Disposition for '{name}': {e}")))?;

    let mut response = match ServeFile::new_with_mime(&path, &mime).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}

/// GET /delete/:filename - Delete a stored file and return to the listing
///
/// Deleting a file that does not exist is not an error.
#[utoipa::path(
    get,
    path = "/delete/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 303, description = "File removed (or already absent); redirect to the file listing"),
        (status = 400, description = "Unsafe file name", body = crate::error::ApiError)
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Redirect, Error> {
    state.downloader.delete_file(&filename).await?;
    Ok(Redirect::to("/files"))
}

/// POST /clear_all - Delete every stored file
#[utoipa::path(
    post,
    path = "/clear_all",
    tag = "files",
    responses(
        (status = 200, description = "All files deleted", body = ClearAllResponse),
        (status = 500, description = "Some or all files could not be deleted", body = ClearAllResponse)
    )
)]
pub async fn clear_all(State(state): State<AppState>) -> impl IntoResponse {
    match state.downloader.clear_all().await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(ClearAllResponse {
                success: true,
                message: Some("All files deleted".to_string()),
                deleted: Some(deleted),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to clear storage directory");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ClearAllResponse {
                    success: false,
                    message: None,
                    deleted: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Build an `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
