//! Response DTOs for the Depot Web API.

use serde::Serialize;

use crate::storage::{FileKind, FileRecord};

/// A file record as returned by the API.
///
/// Field names match the storage wire format (camelCase, `type` for the
/// kind); timestamps are RFC 3339 strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// File id.
    pub id: i64,
    /// Storage key of the blob.
    pub name: String,
    /// Original filename.
    pub original_name: String,
    /// Description.
    pub description: String,
    /// File kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Size in bytes.
    pub size: i64,
    /// Download count.
    pub downloads: i64,
    /// Upload timestamp (RFC 3339).
    pub upload_date: String,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            original_name: record.original_name,
            description: record.description,
            kind: record.kind,
            size: record.size,
            downloads: record.downloads,
            upload_date: record.upload_date.to_rfc3339(),
        }
    }
}
