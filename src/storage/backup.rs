//! Backup and restore of the metadata index and blob directory.
//!
//! The primary store is in-memory plus a local directory, both of which a
//! redeploy wipes. After every mutation the full state is snapshotted into a
//! secondary directory: a `manifest.json` with every record, and a copy of
//! every blob under its storage key. At startup the snapshot is replayed
//! into the primary store.
//!
//! Both directions are best-effort. Individual failures are collected into a
//! report instead of aborting the rest of the pass, and the caller decides
//! what to log; a failed backup never fails the user-facing operation that
//! triggered it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::blob::BlobStore;
use crate::storage::record::{FileIndex, FileRecord};
use crate::Result;

/// Name of the manifest file inside the backup directory.
const MANIFEST_FILE: &str = "manifest.json";

/// Outcome of a backup pass.
#[derive(Debug, Default)]
pub struct BackupReport {
    /// Number of records in the snapshot.
    pub attempted: usize,
    /// Number of blobs copied into the backup directory.
    pub copied: usize,
    /// Per-blob failures as (storage key, reason).
    pub failed: Vec<(String, String)>,
}

impl BackupReport {
    /// Whether every blob made it into the backup.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BackupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "backed up {}/{} files ({} failed)",
            self.copied,
            self.attempted,
            self.failed.len()
        )
    }
}

/// Outcome of a restore pass.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Number of records listed in the manifest.
    pub attempted: usize,
    /// Number of records fully restored (metadata and blob).
    pub restored: usize,
    /// Per-record failures as (storage key, reason).
    pub failed: Vec<(String, String)>,
}

impl RestoreReport {
    /// Whether every manifest record was restored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "restored {}/{} files ({} failed)",
            self.restored,
            self.attempted,
            self.failed.len()
        )
    }
}

/// Snapshots storage state into a backup directory and replays it at startup.
#[derive(Debug, Clone)]
pub struct BackupManager {
    /// Directory owned exclusively by this manager.
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Create a new BackupManager for the given directory.
    ///
    /// The directory itself is created lazily on the first backup, so a
    /// read-only deployment that never mutates anything never writes it.
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Get the backup directory path.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Path of the manifest file.
    fn manifest_path(&self) -> PathBuf {
        self.backup_dir.join(MANIFEST_FILE)
    }

    /// Snapshot the given records and their blobs into the backup directory.
    ///
    /// The manifest is rewritten in full; a manifest write failure fails the
    /// whole call. Blob copy failures are collected in the report and do not
    /// abort the remaining copies.
    pub fn backup_all(&self, records: &[FileRecord], blobs: &BlobStore) -> Result<BackupReport> {
        fs::create_dir_all(&self.backup_dir)?;

        let manifest = serde_json::to_vec_pretty(records)?;
        fs::write(self.manifest_path(), manifest)?;

        let mut report = BackupReport {
            attempted: records.len(),
            ..Default::default()
        };

        for record in records {
            match blobs.load(&record.name) {
                Ok(content) => match fs::write(self.backup_dir.join(&record.name), content) {
                    Ok(()) => report.copied += 1,
                    Err(e) => report.failed.push((record.name.clone(), e.to_string())),
                },
                Err(e) => report.failed.push((record.name.clone(), e.to_string())),
            }
        }

        Ok(report)
    }

    /// Replay the backup snapshot into the index and blob store.
    ///
    /// A missing manifest means there is nothing to restore and yields an
    /// empty report. A record is only inserted into the index once its blob
    /// has been copied back into the primary store; records whose blob copy
    /// fails are skipped and reported.
    pub fn restore_all(&self, index: &mut FileIndex, blobs: &BlobStore) -> Result<RestoreReport> {
        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            return Ok(RestoreReport::default());
        }

        let manifest = fs::read(&manifest_path)?;
        let records: Vec<FileRecord> = serde_json::from_slice(&manifest)?;

        let mut report = RestoreReport {
            attempted: records.len(),
            ..Default::default()
        };

        for record in records {
            let backup_blob = self.backup_dir.join(&record.name);
            let content = match fs::read(&backup_blob) {
                Ok(content) => content,
                Err(e) => {
                    report.failed.push((record.name.clone(), e.to_string()));
                    continue;
                }
            };

            if let Err(e) = blobs.save_with_name(&record.name, &content) {
                report.failed.push((record.name.clone(), e.to_string()));
                continue;
            }

            index.insert_restored(record);
            report.restored += 1;
        }

        Ok(report)
    }

    /// Whether a manifest snapshot exists.
    pub fn has_manifest(&self) -> bool {
        self.manifest_path().exists()
    }
}
