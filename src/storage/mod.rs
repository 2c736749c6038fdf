//! Storage layer for Depot.
//!
//! This module composes three pieces behind a single facade:
//! - In-memory metadata index with a monotonic id generator
//! - Blob store keeping uploaded bytes on the local filesystem under
//!   server-generated keys
//! - Backup/restore manager snapshotting both into a secondary directory
//!   so the otherwise-ephemeral state survives redeploys

mod backup;
mod blob;
mod record;
mod service;

pub use backup::{BackupManager, BackupReport, RestoreReport};
pub use blob::BlobStore;
pub use record::{FileIndex, FileKind, FileRecord, NewFileRecord};
pub use service::{NewUpload, Storage};

/// Maximum length for an original filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum length for a file description (in characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// A backup snapshot is taken every this many downloads of a file.
pub const DOWNLOAD_BACKUP_INTERVAL: i64 = 5;
