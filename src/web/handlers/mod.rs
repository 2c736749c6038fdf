//! API handlers for the Depot Web API.

pub mod file;

pub use file::*;

use std::sync::Arc;

use crate::storage::Storage;

/// Shared application state for the Web API.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage facade.
    pub storage: Arc<Storage>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: Arc<Storage>, max_upload_size: u64) -> Self {
        Self {
            storage,
            max_upload_size,
        }
    }
}
