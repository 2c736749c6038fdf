//! Storage facade for Depot.
//!
//! `Storage` is the single contract the HTTP layer depends on. It composes
//! the metadata index, the blob store, and the backup manager, and guards
//! the index with one mutex so every operation is atomic with respect to
//! concurrent requests touching the same record.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::storage::backup::{BackupManager, RestoreReport};
use crate::storage::blob::BlobStore;
use crate::storage::record::{FileIndex, FileKind, FileRecord, NewFileRecord};
use crate::storage::{DOWNLOAD_BACKUP_INTERVAL, MAX_DESCRIPTION_LENGTH, MAX_FILENAME_LENGTH};
use crate::{DepotError, Result};

/// An upload about to be stored.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// User-supplied filename.
    pub original_name: String,
    /// Optional description; defaults to "<originalName> file".
    pub description: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

/// Storage facade composing index, blob store and backup manager.
///
/// Explicitly constructed and injected into the HTTP layer; there is no
/// global storage singleton. Initialization is directory setup plus a
/// one-shot [`restore`](Storage::restore); there is no teardown beyond
/// process exit.
#[derive(Debug)]
pub struct Storage {
    index: Mutex<FileIndex>,
    blobs: BlobStore,
    backup: BackupManager,
}

impl Storage {
    /// Create a new storage instance.
    ///
    /// Creates the upload directory (including parents); the backup
    /// directory is created lazily by the first backup.
    pub fn new(upload_dir: impl AsRef<Path>, backup_dir: impl AsRef<Path>) -> Result<Self> {
        let blobs = BlobStore::new(upload_dir.as_ref())?;
        let backup = BackupManager::new(backup_dir.as_ref());

        Ok(Self {
            index: Mutex::new(FileIndex::new()),
            blobs,
            backup,
        })
    }

    fn index(&self) -> MutexGuard<'_, FileIndex> {
        // A poisoned lock only means a panic mid-mutation elsewhere; the
        // index itself is still usable.
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replay the backup snapshot into this store.
    ///
    /// Runs once at startup, before any request is served. Never fails the
    /// startup: an unreadable or malformed manifest degrades to an empty
    /// store with a warning.
    pub fn restore(&self) -> RestoreReport {
        let mut index = self.index();
        match self.backup.restore_all(&mut index, &self.blobs) {
            Ok(report) => {
                if report.attempted == 0 {
                    tracing::info!("no backup found, starting with empty storage");
                } else if report.is_complete() {
                    tracing::info!("{report}");
                } else {
                    tracing::warn!(failed = ?report.failed, "{report}");
                }
                report
            }
            Err(e) => {
                tracing::warn!("failed to restore from backup: {e}");
                RestoreReport::default()
            }
        }
    }

    /// All records, most recently uploaded first.
    pub fn list_files(&self) -> Vec<FileRecord> {
        self.index().list_all()
    }

    /// Get a record by id.
    pub fn get_file(&self, id: i64) -> Option<FileRecord> {
        self.index().get(id).cloned()
    }

    /// Find a record by storage key or original filename.
    ///
    /// When several uploads share an original filename, the lowest id wins;
    /// look up by id for determinism.
    pub fn get_file_by_name(&self, key: &str) -> Option<FileRecord> {
        self.index().find_by_name(key).cloned()
    }

    /// Store a new upload: validate the metadata, write the blob, then
    /// register the record.
    ///
    /// Validation runs before the blob write, so a rejected upload leaves no
    /// orphan on disk. A failed blob write aborts the whole operation and no
    /// record is registered.
    pub fn create_file(&self, upload: NewUpload) -> Result<FileRecord> {
        let kind = Self::validate_upload(&upload)?;

        let description = match upload.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => format!("{} file", upload.original_name),
        };

        let name = self.blobs.save(&upload.original_name, &upload.bytes)?;

        let record = self.index().insert(NewFileRecord {
            name,
            original_name: upload.original_name,
            description,
            kind,
            size: upload.bytes.len() as i64,
        });

        self.trigger_backup();

        Ok(record)
    }

    /// Delete a record and its blob. Returns false when the id is unknown.
    ///
    /// The blob delete is best-effort; a blob that is already gone does not
    /// block removing the metadata.
    pub fn delete_file(&self, id: i64) -> bool {
        let removed = {
            let mut index = self.index();
            let Some(record) = index.get(id).cloned() else {
                return false;
            };

            if let Err(e) = self.blobs.delete(&record.name) {
                tracing::warn!(name = %record.name, "failed to delete blob: {e}");
            }
            index.remove(id)
        };

        if removed {
            self.trigger_backup();
        }
        removed
    }

    /// Fetch a file for download: the record plus the blob bytes.
    ///
    /// Increments the download counter on success; the returned record
    /// carries the incremented count. A missing record or blob surfaces as
    /// `NotFound`; an unreadable blob is logged and surfaces the same way.
    pub fn download_file(&self, id: i64) -> Result<(FileRecord, Vec<u8>)> {
        let record = self
            .get_file(id)
            .ok_or_else(|| DepotError::NotFound("file".to_string()))?;

        let bytes = match self.blobs.load(&record.name) {
            Ok(bytes) => bytes,
            Err(DepotError::NotFound(_)) => {
                return Err(DepotError::NotFound("file data".to_string()));
            }
            Err(e) => {
                tracing::error!(name = %record.name, "failed to read blob: {e}");
                return Err(DepotError::NotFound("file data".to_string()));
            }
        };

        let updated = self
            .index()
            .increment_downloads(id)
            .ok_or_else(|| DepotError::NotFound("file".to_string()))?;

        // Bound backup frequency under heavy download traffic
        if updated.downloads % DOWNLOAD_BACKUP_INTERVAL == 0 {
            self.trigger_backup();
        }

        Ok((updated, bytes))
    }

    /// Validate upload metadata; returns the classified kind.
    fn validate_upload(upload: &NewUpload) -> Result<FileKind> {
        let name = upload.original_name.trim();
        if name.is_empty() {
            return Err(DepotError::Validation("filename must not be empty".to_string()));
        }
        if upload.original_name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(DepotError::Validation(format!(
                "filename exceeds {MAX_FILENAME_LENGTH} characters"
            )));
        }
        if let Some(description) = &upload.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(DepotError::Validation(format!(
                    "description exceeds {MAX_DESCRIPTION_LENGTH} characters"
                )));
            }
        }

        let kind = FileKind::from_name(&upload.original_name);
        if !kind.is_allowed() {
            return Err(DepotError::Validation(
                "invalid file type, only .exe, .bat and .zip files are allowed".to_string(),
            ));
        }

        Ok(kind)
    }

    /// Snapshot the current state into the backup directory.
    ///
    /// Best-effort: failures are logged at warn level and swallowed so the
    /// triggering operation's outcome never depends on the backup.
    fn trigger_backup(&self) {
        let records = self.index().list_all();

        match self.backup.backup_all(&records, &self.blobs) {
            Ok(report) if report.is_complete() => {
                tracing::debug!("{report}");
            }
            Ok(report) => {
                tracing::warn!(failed = ?report.failed, "{report}");
            }
            Err(e) => {
                tracing::warn!("backup failed: {e}");
            }
        }
    }
}
