//! REST API server example
//!
//! Runs docbundle behind its HTTP API with default settings.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui
//! - Start a run via POST http://localhost:8000/extract
//! - Poll progress via GET http://localhost:8000/status/{id}
//! - Stream events via GET http://localhost:8000/events

use docbundle::DocumentExtractor;
use docbundle::api::start_api_server;
use docbundle::config::{ApiConfig, Config};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docbundle=info")),
        )
        .init();

    let config = Config {
        work_dir: "work".into(),
        api: ApiConfig {
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            swagger_ui: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let address = config.api.bind_address;

    let extractor = Arc::new(DocumentExtractor::new(config.clone())?);
    let capabilities = extractor.capabilities();

    println!("Starting docbundle REST API server");
    println!("Swagger UI: http://{address}/swagger-ui");
    println!("Events stream: http://{address}/events");
    println!(
        "Tools: office={} ocr={} rasterizer={}",
        capabilities.office.handler, capabilities.ocr.handler, capabilities.rasterizer.handler
    );
    println!();
    println!("Example commands:");
    println!("  # Merge every document in a remote archive into one PDF");
    println!("  curl -X POST http://{address}/extract \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://example.com/bundle.zip\", \"mode\": \"pdf\"}}'");
    println!();
    println!("  # Upload a local archive, text output");
    println!("  curl -F file=@bundle.zip -F mode=txt http://{address}/extract/upload");
    println!();
    println!("  # Fetch the result");
    println!("  curl -OJ http://{address}/download/<task_id>");

    // Runs until the process is stopped
    start_api_server(extractor, Arc::new(config)).await?;

    Ok(())
}
