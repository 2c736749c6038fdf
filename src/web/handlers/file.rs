//! File handlers for the Depot Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::storage::NewUpload;
use crate::web::dto::{FileResponse, UploadRequest};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Query parameters for file download.
#[derive(Debug, serde::Deserialize)]
pub struct DownloadQuery {
    /// Serve the file inline instead of as an attachment.
    #[serde(default)]
    pub direct: bool,
}

/// Parse a path segment as a file id.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid file ID"))
}

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Sanitizes the filename to prevent header injection and uses RFC 5987
/// encoding for non-ASCII filenames:
/// - Control characters (including CR, LF) are removed
/// - Double quotes and backslashes are replaced
/// - Non-ASCII names get a `filename*` parameter with UTF-8 encoding
fn content_disposition_header(filename: &str, inline: bool) -> String {
    let disposition = if inline { "inline" } else { "attachment" };

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '_',
            '\\' => '_',
            _ => c,
        })
        .collect();

    // Simple format for plain ASCII filenames
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{}; filename=\"{}\"", disposition, filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, sanitized, encoded
    )
}

/// GET /api/files - List all files, newest first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let files = state
        .storage
        .list_files()
        .into_iter()
        .map(FileResponse::from)
        .collect();

    Ok(Json(files))
}

/// POST /api/files - Upload a file.
///
/// Request body: multipart/form-data with a `file` part and an optional
/// `description` part.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let mut original_name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                original_name = field.file_name().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::debug!("failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "description" => {
                description = Some(field.text().await.map_err(|e| {
                    tracing::debug!("failed to read description: {}", e);
                    ApiError::bad_request("Invalid description")
                })?);
            }
            _ => {}
        }
    }

    let original_name = original_name.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let content = content.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if content.len() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::bad_request(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let request = UploadRequest {
        original_name,
        description,
    };
    request.validate().map_err(ApiError::from_validation_errors)?;

    let record = state.storage.create_file(NewUpload {
        original_name: request.original_name,
        description: request.description,
        bytes: content,
    })?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

/// DELETE /api/files/:id - Delete a file and its blob.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if state.storage.delete_file(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("File not found"))
    }
}

/// GET /api/files/:id/download - Download a file.
///
/// Streams the blob with Content-Disposition `attachment`, or `inline` when
/// `?direct=true` is passed; the download counter is incremented either way.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response<Body>, ApiError> {
    let id = parse_id(&id)?;

    let (record, content) = state.storage.download_file(id)?;

    // Attachments are always served as raw bytes; inline viewing gets a
    // sniffed type so the browser can render what it understands.
    let content_type = if query.direct {
        mime_guess::from_path(&record.original_name)
            .first_or_octet_stream()
            .to_string()
    } else {
        mime_guess::mime::APPLICATION_OCTET_STREAM.to_string()
    };

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.original_name, query.direct),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}
