//! Error types for the Marionette runtime

use thiserror::Error;

/// Main error type for the runtime
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid frame rate: {0} (must be positive and finite)")]
    InvalidFps(f32),

    #[error("Skeleton error: {0}")]
    Skeleton(String),

    #[error("Clip error: {0}")]
    Clip(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
