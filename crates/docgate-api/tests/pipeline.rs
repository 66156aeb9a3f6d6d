//! End-to-end pipeline tests over the in-process router.
//!
//! Every test finishes by asserting the no-leak property: once the response
//! body has been fully consumed (or the request failed), the scratch
//! directory is empty again.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use docgate_api::ApiServer;
use docgate_config::AppConfig;
use docgate_scratch::ScratchStore;
use docgate_telemetry::Metrics;
use docgate_transform::Dispatcher;
use docgate_test_support::{MultipartBody, StubRasterizer, pdf_bytes};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_router(scratch_root: &std::path::Path) -> Result<Router> {
    let mut config = AppConfig::default();
    config.scratch.root = PathBuf::from(scratch_root);
    config.app.cors_origin = "*".to_string();

    let metrics = Metrics::new()?;
    let store = ScratchStore::open(scratch_root, metrics.clone())?;
    let dispatcher = Dispatcher::new(Arc::new(StubRasterizer), config.pipeline);
    Ok(ApiServer::new(config, metrics, store, dispatcher)?.into_router())
}

fn scratch_entries(dir: &TempDir) -> Vec<String> {
    std::fs::read_dir(dir.path())
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

fn multipart_request(path: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .expect("request construction cannot fail")
}

async fn body_bytes(response: axum::response::Response) -> Result<Vec<u8>> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(bytes.to_vec())
}

#[tokio::test]
async fn liveness_payload_is_served_at_root() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await?;
    let payload: serde_json::Value = serde_json::from_slice(&body)?;
    assert!(payload["message"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn extension_gate_rejects_without_creating_scratch_files() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "report.txt", "text/plain", b"not a pdf")
        .build();
    let response = router
        .oneshot(multipart_request(
            "/compress/compress-pdf",
            &content_type,
            body,
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(response).await?;
    let problem: serde_json::Value = serde_json::from_slice(&body)?;
    let detail = problem["detail"].as_str().unwrap_or_default();
    assert!(detail.contains("report.txt"), "detail names the file: {detail}");
    assert!(
        scratch_entries(&dir).is_empty(),
        "a rejected upload must leave no scratch file"
    );
    Ok(())
}

#[tokio::test]
async fn split_with_merge_streams_one_pdf_and_cleans_up() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "report.pdf", "application/pdf", &pdf_bytes(5))
        .text("pages", "1-3,5")
        .text("merge", "true")
        .build();
    let response = router
        .oneshot(multipart_request("/split/split-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("split_report.pdf"), "{disposition}");

    let body = body_bytes(response).await?;
    assert!(body.starts_with(b"%PDF"));
    let document = lopdf_load(&body)?;
    assert_eq!(document.get_pages().len(), 4);

    assert!(
        scratch_entries(&dir).is_empty(),
        "all scratch files must be released after delivery: {:?}",
        scratch_entries(&dir)
    );
    Ok(())
}

#[tokio::test]
async fn split_without_merge_streams_a_zip_of_pages() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "report.pdf", "application/pdf", &pdf_bytes(4))
        .text("pages", "2,4")
        .text("merge", "false")
        .build();
    let response = router
        .oneshot(multipart_request("/split/split-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/zip")
    );

    let body = body_bytes(response).await?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body))?;
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("report_page_2.pdf").is_ok());
    assert!(archive.by_name("report_page_4.pdf").is_ok());

    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn out_of_range_split_selection_is_a_client_error() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "short.pdf", "application/pdf", &pdf_bytes(2))
        .text("pages", "10")
        .build();
    let response = router
        .oneshot(multipart_request("/split/split-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(response).await?;
    let problem: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(
        problem["detail"].as_str(),
        Some("No valid pages selected.")
    );
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn merge_concatenates_uploads_in_order() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("files", "a.pdf", "application/pdf", &pdf_bytes(2))
        .file("files", "b.pdf", "application/pdf", &pdf_bytes(3))
        .build();
    let response = router
        .oneshot(multipart_request("/merge/merge-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("merged_document.pdf"));

    let body = body_bytes(response).await?;
    assert_eq!(lopdf_load(&body)?.get_pages().len(), 5);
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected_before_processing() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "secret.pdf", "application/pdf", &pdf_bytes(1))
        .text("password", "abc")
        .build();
    let response = router
        .oneshot(multipart_request(
            "/protect/protect-pdf",
            &content_type,
            body,
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(response).await?;
    let problem: serde_json::Value = serde_json::from_slice(&body)?;
    assert_eq!(
        problem["detail"].as_str(),
        Some("Password must be at least 4 characters long.")
    );
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn protect_produces_an_encrypted_document() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "secret.pdf", "application/pdf", &pdf_bytes(1))
        .text("password", "hunter42")
        .build();
    let response = router
        .oneshot(multipart_request(
            "/protect/protect-pdf",
            &content_type,
            body,
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await?;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("/Encrypt"));
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_edit_instructions_are_unprocessable() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "doc.pdf", "application/pdf", &pdf_bytes(1))
        .text("edits", "{not json")
        .build();
    let response = router
        .oneshot(multipart_request("/convert/edit-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn edit_applies_in_range_instructions_and_skips_the_rest() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let edits = serde_json::json!({
        "rectangles": [
            { "id": "r1", "pageIndex": 0, "x": 0.1, "y": 0.1, "width": 0.3, "height": 0.1 },
            { "id": "r2", "pageIndex": 99, "x": 0.1, "y": 0.1, "width": 0.3, "height": 0.1 }
        ],
        "texts": [
            { "id": "t1", "pageIndex": 0, "text": "Reviewed", "x": 0.2, "y": 0.4 }
        ]
    });
    let (content_type, body) = MultipartBody::new()
        .file("file", "doc.pdf", "application/pdf", &pdf_bytes(3))
        .text("edits", &edits.to_string())
        .build();
    let response = router
        .oneshot(multipart_request("/convert/edit-pdf", &content_type, body))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await?;
    let document = lopdf_load(&body)?;
    let first_page = document.get_pages()[&1];
    let content = document.get_page_content(first_page)?;
    assert!(String::from_utf8_lossy(&content).contains("Reviewed"));
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn compress_rebuilds_the_document_through_the_rasterizer() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let (content_type, body) = MultipartBody::new()
        .file("file", "big.pdf", "application/pdf", &pdf_bytes(2))
        .build();
    let response = router
        .oneshot(multipart_request(
            "/compress/compress-pdf",
            &content_type,
            body,
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("compressed_big.pdf"));
    let body = body_bytes(response).await?;
    assert_eq!(lopdf_load(&body)?.get_pages().len(), 2);
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_same_name_uploads_do_not_collide() -> Result<()> {
    let dir = TempDir::new()?;
    let router = test_router(dir.path())?;

    let request_for = |pages: usize| {
        let (content_type, body) = MultipartBody::new()
            .file("file", "input.pdf", "application/pdf", &pdf_bytes(pages))
            .text("pages", "1")
            .build();
        multipart_request("/split/split-pdf", &content_type, body)
    };

    let (first, second) = tokio::join!(
        router.clone().oneshot(request_for(2)),
        router.clone().oneshot(request_for(3)),
    );
    let first = first?;
    let second = second?;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first_body = body_bytes(first).await?;
    let second_body = body_bytes(second).await?;
    assert_eq!(lopdf_load(&first_body)?.get_pages().len(), 1);
    assert_eq!(lopdf_load(&second_body)?.get_pages().len(), 1);
    assert!(scratch_entries(&dir).is_empty());
    Ok(())
}

fn lopdf_load(bytes: &[u8]) -> Result<lopdf::Document> {
    Ok(lopdf::Document::load_mem(bytes)?)
}
