//! Web API File Tests
//!
//! Integration tests for the file endpoints.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use depot::web::handlers::AppState;
use depot::web::router::{create_health_router, create_router};
use depot::Storage;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a test server backed by temp directories.
fn create_test_server() -> (TestServer, Arc<Storage>, TempDir) {
    create_test_server_with_limit(100 * 1024 * 1024)
}

/// Create a test server with a custom upload size ceiling.
fn create_test_server_with_limit(max_upload_size: u64) -> (TestServer, Arc<Storage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let storage = Arc::new(
        Storage::new(
            temp_dir.path().join("uploads"),
            temp_dir.path().join("file_backups"),
        )
        .expect("Failed to create storage"),
    );
    storage.restore();

    let app_state = Arc::new(AppState::new(storage.clone(), max_upload_size));
    let router = create_router(app_state, &[]).merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    (server, storage, temp_dir)
}

/// Build a multipart upload form.
fn upload_form(filename: &str, bytes: &[u8], description: Option<&str>) -> MultipartForm {
    let mut form = MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes.to_vec())
            .file_name(filename)
            .mime_type("application/octet-stream"),
    );
    if let Some(desc) = description {
        form = form.add_text("description", desc);
    }
    form
}

/// Upload a file and return the created record as JSON.
async fn upload_file(server: &TestServer, filename: &str, bytes: &[u8]) -> Value {
    let response = server
        .post("/api/files")
        .multipart(upload_form(filename, bytes, None))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Count entries in the primary upload directory.
fn upload_dir_count(temp_dir: &TempDir) -> usize {
    std::fs::read_dir(temp_dir.path().join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_files_empty() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.get("/api/files").await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body.is_array());
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_files_newest_first() {
    let (server, _storage, _temp_dir) = create_test_server();

    upload_file(&server, "first.exe", b"first").await;
    upload_file(&server, "second.bat", b"second").await;
    upload_file(&server, "third.zip", b"third").await;

    let response = server.get("/api/files").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let files = body.as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["originalName"], "third.zip");
    assert_eq!(files[1]["originalName"], "second.bat");
    assert_eq!(files[2]["originalName"], "first.exe");
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_file_success() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server
        .post("/api/files")
        .multipart(upload_form("setup.exe", b"MZ\x90\x00", Some("installer")))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["id"], 1);
    assert_eq!(body["originalName"], "setup.exe");
    assert_eq!(body["description"], "installer");
    assert_eq!(body["type"], "exe");
    assert_eq!(body["size"], 4);
    assert_eq!(body["downloads"], 0);
    assert!(body["name"].as_str().unwrap().ends_with(".exe"));
    assert!(body["uploadDate"].is_string());
}

#[tokio::test]
async fn test_upload_without_description_gets_default() {
    let (server, _storage, _temp_dir) = create_test_server();

    let body = upload_file(&server, "run.bat", b"@echo off").await;

    assert_eq!(body["description"], "run.bat file");
}

#[tokio::test]
async fn test_upload_ids_are_monotonic() {
    let (server, _storage, _temp_dir) = create_test_server();

    let a = upload_file(&server, "a.exe", b"a").await;
    let b = upload_file(&server, "b.exe", b"b").await;
    let c = upload_file(&server, "c.exe", b"c").await;

    assert_eq!(a["id"], 1);
    assert_eq!(b["id"], 2);
    assert_eq!(c["id"], 3);
}

#[tokio::test]
async fn test_upload_no_file_field() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server
        .post("/api/files")
        .multipart(MultipartForm::new().add_text("description", "no file here"))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_disallowed_extension_rejected() {
    let (server, _storage, temp_dir) = create_test_server();

    let response = server
        .post("/api/files")
        .multipart(upload_form("virus.scr", b"bad bytes", None))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("only .exe, .bat and .zip"));

    // No blob was written and no record registered
    assert_eq!(upload_dir_count(&temp_dir), 0);
    let list: Value = server.get("/api/files").await.json();
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_extension_check_is_case_insensitive() {
    let (server, _storage, _temp_dir) = create_test_server();

    let body = upload_file(&server, "SETUP.EXE", b"MZ").await;
    assert_eq!(body["type"], "exe");

    let body = upload_file(&server, "Bundle.Zip", b"PK").await;
    assert_eq!(body["type"], "zip");
}

#[tokio::test]
async fn test_upload_over_size_ceiling_rejected() {
    // 1 KiB ceiling
    let (server, _storage, temp_dir) = create_test_server_with_limit(1024);

    let oversized = vec![0u8; 4096];
    let response = server
        .post("/api/files")
        .multipart(upload_form("big.zip", &oversized, None))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("File too large"));

    // Rejected before any blob write
    assert_eq!(upload_dir_count(&temp_dir), 0);
}

#[tokio::test]
async fn test_upload_filename_with_control_chars_rejected() {
    let (server, _storage, temp_dir) = create_test_server();

    let response = server
        .post("/api/files")
        .multipart(upload_form("evil\r\nname.exe", b"MZ", None))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(upload_dir_count(&temp_dir), 0);
}

// ============================================================================
// Download Tests
// ============================================================================

#[tokio::test]
async fn test_download_round_trip() {
    let (server, _storage, _temp_dir) = create_test_server();

    let content: Vec<u8> = (0..=255).collect();
    let body = upload_file(&server, "setup.exe", &content).await;
    let id = body["id"].as_i64().unwrap();

    let response = server.get(&format!("/api/files/{}/download", id)).await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), content.as_slice());

    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/octet-stream"
    );
    let disposition = headers
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("setup.exe"));
    assert_eq!(
        headers.get("content-length").unwrap().to_str().unwrap(),
        "256"
    );
}

#[tokio::test]
async fn test_download_direct_serves_inline() {
    let (server, _storage, _temp_dir) = create_test_server();

    let body = upload_file(&server, "bundle.zip", b"PK\x03\x04").await;
    let id = body["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/files/{}/download?direct=true", id))
        .await;

    response.assert_status_ok();

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("inline"));
}

#[tokio::test]
async fn test_download_increments_counter() {
    let (server, _storage, _temp_dir) = create_test_server();

    let body = upload_file(&server, "setup.exe", b"MZ").await;
    let id = body["id"].as_i64().unwrap();

    for _ in 0..3 {
        server
            .get(&format!("/api/files/{}/download", id))
            .await
            .assert_status_ok();
    }

    let list: Value = server.get("/api/files").await.json();
    assert_eq!(list[0]["downloads"], 3);
}

#[tokio::test]
async fn test_download_unknown_id() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.get("/api/files/99999/download").await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_download_invalid_id() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.get("/api/files/abc/download").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid file ID");
}

#[tokio::test]
async fn test_download_missing_blob_is_not_found() {
    let (server, _storage, temp_dir) = create_test_server();

    let body = upload_file(&server, "setup.exe", b"MZ").await;
    let id = body["id"].as_i64().unwrap();
    let key = body["name"].as_str().unwrap();

    std::fs::remove_file(temp_dir.path().join("uploads").join(key)).unwrap();

    let response = server.get(&format!("/api/files/{}/download", id)).await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_file() {
    let (server, _storage, temp_dir) = create_test_server();

    let body = upload_file(&server, "setup.exe", b"MZ").await;
    let id = body["id"].as_i64().unwrap();
    assert_eq!(upload_dir_count(&temp_dir), 1);

    let response = server.delete(&format!("/api/files/{}", id)).await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    // Both the record and the blob are gone
    assert_eq!(upload_dir_count(&temp_dir), 0);
    let list: Value = server.get("/api/files").await.json();
    assert_eq!(list.as_array().unwrap().len(), 0);

    server
        .get(&format!("/api/files/{}/download", id))
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.delete("/api/files/99999").await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_invalid_id() {
    let (server, _storage, _temp_dir) = create_test_server();

    let response = server.delete("/api/files/not-a-number").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_no_id_reuse_after_delete() {
    let (server, _storage, _temp_dir) = create_test_server();

    upload_file(&server, "a.exe", b"a").await;
    let b = upload_file(&server, "b.exe", b"b").await;
    upload_file(&server, "c.exe", b"c").await;

    server
        .delete(&format!("/api/files/{}", b["id"].as_i64().unwrap()))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let d = upload_file(&server, "d.exe", b"d").await;
    assert_eq!(d["id"], 4);
}
