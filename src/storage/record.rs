//! File metadata records and the in-memory index.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a distributable, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Windows executable (.exe).
    Exe,
    /// Batch script (.bat).
    Bat,
    /// Zip archive (.zip).
    Zip,
    /// Anything else. Rejected at upload time.
    Other,
}

impl FileKind {
    /// Classify a filename by its extension (case-insensitive).
    pub fn from_name(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match ext.as_deref() {
            Some("exe") => FileKind::Exe,
            Some("bat") => FileKind::Bat,
            Some("zip") => FileKind::Zip,
            _ => FileKind::Other,
        }
    }

    /// Whether this kind is accepted for upload.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, FileKind::Other)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Exe => "exe",
            FileKind::Bat => "bat",
            FileKind::Zip => "zip",
            FileKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Metadata for one distributable.
///
/// Serialized with camelCase field names; this is both the backup manifest
/// entry format and the shape API clients expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique file id, assigned by the index, never reused.
    pub id: i64,
    /// Server-generated storage key (`<uuid>.<ext>`) locating the blob.
    pub name: String,
    /// User-supplied filename, used for display and download headers.
    pub original_name: String,
    /// Free-text description.
    pub description: String,
    /// Distributable kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Blob size in bytes.
    pub size: i64,
    /// Number of times downloaded.
    pub downloads: i64,
    /// When the file was uploaded. Immutable after insert.
    pub upload_date: DateTime<Utc>,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Storage key returned by the blob store.
    pub name: String,
    /// Original filename.
    pub original_name: String,
    /// Description.
    pub description: String,
    /// Distributable kind.
    pub kind: FileKind,
    /// Blob size in bytes.
    pub size: i64,
}

/// In-memory mapping from file id to record, with a monotonic id generator.
///
/// Not synchronized by itself; [`Storage`](super::Storage) guards it with a
/// mutex so facade operations stay atomic with respect to each other.
#[derive(Debug)]
pub struct FileIndex {
    records: BTreeMap<i64, FileRecord>,
    next_id: i64,
}

impl Default for FileIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIndex {
    /// Create an empty index. Ids start at 1.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// All records, most recently uploaded first.
    ///
    /// Ties on the upload timestamp are broken by id, newest first.
    pub fn list_all(&self) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }

    /// Get a record by id.
    pub fn get(&self, id: i64) -> Option<&FileRecord> {
        self.records.get(&id)
    }

    /// Find the first record whose storage key or original filename equals
    /// `key`.
    ///
    /// When two uploads share an original filename the match is whichever
    /// comes first in id order; callers that need determinism should look up
    /// by id.
    pub fn find_by_name(&self, key: &str) -> Option<&FileRecord> {
        self.records
            .values()
            .find(|r| r.name == key || r.original_name == key)
    }

    /// Insert a new record, assigning the next id and the current timestamp.
    pub fn insert(&mut self, new: NewFileRecord) -> FileRecord {
        let id = self.next_id;
        self.next_id += 1;

        let record = FileRecord {
            id,
            name: new.name,
            original_name: new.original_name,
            description: new.description,
            kind: new.kind,
            size: new.size,
            downloads: 0,
            upload_date: Utc::now(),
        };

        self.records.insert(id, record.clone());
        record
    }

    /// Insert a record restored from a backup manifest, keeping its original
    /// id and advancing the id counter past it.
    pub fn insert_restored(&mut self, record: FileRecord) {
        if record.id >= self.next_id {
            self.next_id = record.id + 1;
        }
        self.records.insert(record.id, record);
    }

    /// Remove a record. Returns whether a record was removed.
    pub fn remove(&mut self, id: i64) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Increment the download counter for a record and return the updated
    /// record, or `None` if the id is unknown.
    pub fn increment_downloads(&mut self, id: i64) -> Option<FileRecord> {
        let record = self.records.get_mut(&id)?;
        record.downloads += 1;
        Some(record.clone())
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
