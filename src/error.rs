//! Error handling for LAS processing operations.
//!
//! [`LasError`] covers infrastructure failures: I/O, configuration loading,
//! directory traversal and task joining. Failures inside the document
//! pipeline itself are never surfaced this way; they are recorded as
//! [`crate::app::models::ErrorRecord`] values on the returned document.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid known-sections table: {reason}")]
    InvalidSectionsTable { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Directory traversal error: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Worker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<serde_json::Error> for LasError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidSectionsTable {
            reason: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LasError>;
