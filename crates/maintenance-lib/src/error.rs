//! Error types shared by the generator, dataset, training and serving layers

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the maintenance library
#[derive(Error, Debug)]
pub enum MaintenanceError {
    /// Bad generation or training parameters (zero samples, empty fleet, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Model artifact or exported data file missing
    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A transform or prediction was requested before fitting
    #[error("Model not fitted: {0}")]
    NotFitted(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl MaintenanceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MaintenanceError::InvalidArgument(message.into())
    }

    /// True for errors a caller should surface as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, MaintenanceError::ArtifactNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, MaintenanceError>;
