//! Blob store for Depot.
//!
//! Uploaded bytes live in a flat directory, one file per blob, named by a
//! server-generated storage key. Keys are never derived from user-supplied
//! filenames, which rules out path traversal and name collisions; the
//! original filename survives only in metadata.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{DepotError, Result};

/// Filesystem-backed binary storage addressed by generated keys.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Directory holding the blobs.
    base_path: PathBuf,
}

impl BlobStore {
    /// Create a new BlobStore rooted at the given directory.
    ///
    /// The directory (including parents) is created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a freshly generated storage key.
    ///
    /// The key is a random UUID with the original file's extension appended,
    /// so later downloads can be type-sniffed by extension. Returns the key.
    /// A failed write is a hard error; the caller must not register metadata
    /// for it.
    pub fn save(&self, original_name: &str, content: &[u8]) -> Result<String> {
        let key = Self::generate_key(original_name);
        self.save_with_name(&key, content)?;
        Ok(key)
    }

    /// Save content under a specific key.
    ///
    /// Used by the restore path, which already has keys from the manifest.
    pub fn save_with_name(&self, key: &str, content: &[u8]) -> Result<()> {
        fs::write(self.blob_path(key), content)?;
        Ok(())
    }

    /// Load the content stored under a key.
    ///
    /// Returns `DepotError::NotFound` when no such blob exists.
    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(key)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the blob stored under a key.
    ///
    /// Returns `Ok(false)` when the blob was already gone; absence is not an
    /// error.
    pub fn delete(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a blob exists.
    pub fn exists(&self, key: &str) -> bool {
        self.blob_path(key).exists()
    }

    /// Get the size of a stored blob in bytes.
    pub fn file_size(&self, key: &str) -> Result<u64> {
        match fs::metadata(self.blob_path(key)) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DepotError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Full filesystem path for a storage key.
    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Generate a new storage key for an original filename.
    ///
    /// `<uuid-v4>.<ext>`, with `bin` when the filename has no extension.
    pub fn generate_key(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }

    /// Extract the file extension from a filename, defaulting to "bin".
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bin")
    }
}
