use super::*;
use crate::test_support::{scripted_toolchain, write_pdf};
use crate::types::TaskStatus;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


const BOUNDARY: &str = "----docbundleTestBoundary7MA4YWxk";

/// Extractor over scripted tools with its work dir inside `temp_dir`
fn create_test_extractor(temp_dir: &TempDir) -> Arc<DocumentExtractor> {
    let config = Config {
        work_dir: temp_dir.path().join("work"),
        ..Default::default()
    };
    Arc::new(DocumentExtractor::with_toolchain(config, scripted_toolchain()).unwrap())
}

fn router_for(extractor: &Arc<DocumentExtractor>) -> Router {
    let config = extractor.config().clone();
    create_router(extractor.clone(), config)
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response should be valid JSON")
}

/// A zip holding one single-page PDF
fn pdf_zip(temp_dir: &TempDir) -> Vec<u8> {
    let pdf = temp_dir.path().join("upload.pdf");
    write_pdf(&pdf, &["uploaded"]);
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = ::zip::ZipWriter::new(&mut buffer);
        writer
            .start_file("upload.pdf", ::zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(&std::fs::read(&pdf).unwrap()).unwrap();
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

/// multipart/form-data body with an optional file part and an optional mode part
fn multipart_body(file: Option<(&str, &[u8])>, mode: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(mode) = mode {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"mode\"\r\n\r\n\
                 {mode}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/extract/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Upload `data` and return the started task's ID
async fn upload(app: &Router, name: &str, data: &[u8], mode: Option<&str>) -> String {
    let response = app
        .clone()
        .oneshot(upload_request(multipart_body(Some((name, data)), mode)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "started");
    json["task_id"].as_str().unwrap().to_string()
}

/// Poll GET /status/:id until the task finishes
async fn wait_finished(app: &Router, task_id: &str) -> serde_json::Value {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let request = Request::builder()
                .uri(format!("/status/{task_id}"))
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let json = body_json(response).await;
            if json["status"] != TaskStatus::Processing.to_string() {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("task should finish in time")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let mut config = (**extractor.config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let extractor = extractor.clone();
        async move { start_api_server(extractor, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let mut config = (**extractor.config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(extractor, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let mut config = (**extractor.config()).clone();
    config.api.cors_enabled = false;
    let app = create_router(extractor, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let mut config = (**extractor.config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(extractor, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://allowed.example")
    );
}

#[tokio::test]
async fn test_default_router_serves_openapi_and_swagger_ui() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let config = Config::default();
    assert!(config.api.swagger_ui, "Swagger UI is on by default");
    let app = create_router(extractor, Arc::new(config));

    for uri in ["/openapi.json", "/api-docs/openapi.json"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        let json = body_json(response).await;
        assert!(json["paths"]["/extract"].is_object(), "GET {uri}");
    }

    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success(), "got {}", response.status());
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let temp_dir = TempDir::new().unwrap();
    let extractor = create_test_extractor(&temp_dir);

    let mut config = (**extractor.config()).clone();
    config.api.swagger_ui = false;
    let app = create_router(extractor, Arc::new(config));

    let request = Request::builder()
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
