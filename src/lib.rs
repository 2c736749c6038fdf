//! Depot - a small self-hosted depot for binary distributables.
//!
//! Uploads live in an in-memory metadata index plus a local blob directory,
//! snapshotted into a backup directory after every mutation so the state
//! survives redeploys.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod web;

pub use config::Config;
pub use error::{DepotError, Result};
pub use storage::{
    BackupManager, BackupReport, BlobStore, FileIndex, FileKind, FileRecord, NewUpload,
    RestoreReport, Storage,
};
pub use web::WebServer;
