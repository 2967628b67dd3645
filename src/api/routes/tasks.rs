//! Task submission and tracking handlers.

use super::{ExtractRequest, ExtractResponse, parse_task_id};
use crate::api::AppState;
use crate::error::Error;
use crate::pipeline::Source;
use crate::types::{OutputMode, TaskRecord};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /extract - Process an archive fetched from a URL
#[utoipa::path(
    post,
    path = "/extract",
    tag = "tasks",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Task started", body = ExtractResponse),
        (status = 400, description = "Invalid request"),
        (status = 422, description = "Malformed JSON body")
    )
)]
pub async fn extract(State(state): State<AppState>, Json(request): Json<ExtractRequest>) -> Response {
    let url = request.url.trim();
    if url.is_empty() {
        return Error::InvalidInput("url must not be empty".to_string()).into_response();
    }

    let task_id = state
        .extractor
        .submit(Source::Url(url.to_string()), request.mode)
        .await;

    (StatusCode::OK, Json(ExtractResponse::started(task_id))).into_response()
}

/// POST /extract/upload - Process an uploaded archive
#[utoipa::path(
    post,
    path = "/extract/upload",
    tag = "tasks",
    request_body(content = Vec<u8>, description = "Archive upload (multipart/form-data) with a `file` field and an optional `mode` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Task started", body = ExtractResponse),
        (status = 400, description = "Missing file or invalid mode")
    )
)]
pub async fn extract_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut mode = OutputMode::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Error::InvalidInput(format!("malformed multipart body: {}", e)).into_response();
            }
        };

        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => data = Some(bytes.to_vec()),
                    Err(e) => {
                        return Error::InvalidInput(format!("failed to read file: {}", e))
                            .into_response();
                    }
                }
            }
            "mode" => {
                let raw = match field.text().await {
                    Ok(raw) => raw,
                    Err(e) => {
                        return Error::InvalidInput(format!("failed to read mode: {}", e))
                            .into_response();
                    }
                };
                match raw.parse() {
                    Ok(parsed) => mode = parsed,
                    Err(e) => return e.into_response(),
                }
            }
            _ => {}
        }
    }

    let Some(data) = data else {
        return Error::InvalidInput("no archive provided in 'file' field".to_string()).into_response();
    };

    let task_id = state
        .extractor
        .submit(
            Source::Bytes {
                name: file_name,
                data,
            },
            mode,
        )
        .await;

    (StatusCode::OK, Json(ExtractResponse::started(task_id))).into_response()
}

/// GET /status/:id - Task status
#[utoipa::path(
    get,
    path = "/status/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task record", body = TaskRecord),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match parse_task_id(&id) {
        Ok(task_id) => state.extractor.status(task_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /tasks - List all tasks
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All known tasks, oldest first", body = Vec<TaskRecord>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.extractor.list().await))
}

/// DELETE /tasks/:id - Remove a finished task and its output
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task removed"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task is still processing")
    )
)]
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match parse_task_id(&id) {
        Ok(task_id) => state.extractor.remove_task(task_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
