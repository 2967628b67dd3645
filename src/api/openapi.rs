//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the docbundle REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the docbundle REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (reads `/api-docs/openapi.json`)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "docbundle REST API",
        version = "0.1.0",
        description = "Submit an archive, get back one PDF or text file holding every document inside it",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::extract,
        crate::api::routes::extract_upload,
        crate::api::routes::get_status,
        crate::api::routes::list_tasks,
        crate::api::routes::delete_task,

        // Files
        crate::api::routes::view_file,
        crate::api::routes::download_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_capabilities,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::TaskRecord,
        crate::types::OutputMode,
        crate::types::Stage,
        crate::types::RunStats,
        crate::types::Event,
        crate::types::Capabilities,
        crate::types::ToolCapabilityInfo,

        // Classification
        crate::inspector::FileClass,
        crate::inspector::ArchiveKind,
        crate::inspector::DocumentKind,
        crate::inspector::ImageKind,

        // Config types from config.rs
        crate::config::Config,
        crate::config::InspectionConfig,
        crate::config::ExtractionConfig,
        crate::config::ConversionConfig,
        crate::config::ToolsConfig,
        crate::config::DownloadConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::ExtractRequest,
        crate::api::routes::ExtractResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Submit archives and track extraction tasks"),
        (name = "files", description = "View or download a completed task's output"),
        (name = "system", description = "Health, capabilities, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
