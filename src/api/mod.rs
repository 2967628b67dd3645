//! REST API server module
//!
//! HTTP front end for [`DocumentExtractor`]: submit archives by URL or
//! upload, poll task status, fetch the merged output, and stream run events.

use crate::{Config, DocumentExtractor, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /extract` - Start a task for an archive URL
/// - `POST /extract/upload` - Start a task for an uploaded archive
/// - `GET /status/:id` - Task status
/// - `GET /tasks` - All tasks
/// - `DELETE /tasks/:id` - Remove a finished task and its output
///
/// ## Files
/// - `GET /view/:id` - Output shown inline
/// - `GET /download/:id` - Output as an attachment
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /capabilities` - Available conversion tools
/// - `GET /events` - Server-sent events stream
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled), backed by
///   `GET /api-docs/openapi.json`
pub fn create_router(extractor: Arc<DocumentExtractor>, config: Arc<Config>) -> Router {
    let state = AppState::new(extractor, config.clone());

    let router = Router::new()
        // Tasks
        .route("/extract", post(routes::extract))
        .route("/extract/upload", post(routes::extract_upload))
        .route("/status/:id", get(routes::get_status))
        .route("/tasks", get(routes::list_tasks))
        .route("/tasks/:id", delete(routes::delete_task))
        // Files
        .route("/view/:id", get(routes::view_file))
        .route("/download/:id", get(routes::download_file))
        // System
        .route("/health", get(routes::health_check))
        .route("/capabilities", get(routes::get_capabilities))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI is merged before state is applied; its document route must not overlap /openapi.json
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until the server stops.
///
/// # Example
///
/// ```no_run
/// use docbundle::{Config, DocumentExtractor};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let extractor = Arc::new(DocumentExtractor::new((*config).clone())?);
///
/// docbundle::api::start_api_server(extractor, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(extractor: Arc<DocumentExtractor>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(extractor, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
