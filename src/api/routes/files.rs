//! Handlers serving a completed task's aggregate output.

use super::parse_task_id;
use crate::api::AppState;
use crate::error::Error;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// GET /view/:id - Show the output inline (browser PDF preview)
#[utoipa::path(
    get,
    path = "/view/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Output file, inline", content_type = "application/pdf"),
        (status = 400, description = "Task not completed"),
        (status = 404, description = "Task or file not found")
    )
)]
pub async fn view_file(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let (path, mode) = match ready_output(&state, &id).await {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(?path, error = %e, "failed to read output for viewing");
            return Error::Io(e).into_response();
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mode.content_type()),
            (header::CONTENT_DISPOSITION, "inline"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
            (header::ACCEPT_RANGES, "bytes"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        content,
    )
        .into_response()
}

/// GET /download/:id - Download the output as an attachment
#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Output file, as attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Task not completed"),
        (status = 404, description = "Task or file not found")
    )
)]
pub async fn download_file(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let (path, mode) = match ready_output(&state, &id).await {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(?path, error = %e, "failed to open output for download");
            return Error::Io(e).into_response();
        }
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| mode.final_file_name().to_string());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mode.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

async fn ready_output(
    state: &AppState,
    raw_id: &str,
) -> crate::Result<(std::path::PathBuf, crate::types::OutputMode)> {
    let task_id = parse_task_id(raw_id)?;
    state.extractor.output_file(task_id).await
}
