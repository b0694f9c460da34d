//! Error types for Dermacap

use thiserror::Error;

/// Main error type for capture pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Camera device error: {0}")]
    Camera(String),

    #[error("Camera configuration failed: {0}")]
    Configure(String),

    #[error("Frame decode error: {0}")]
    Decode(String),

    #[error("No frame available to capture")]
    NoFrame,

    #[error("Capture already frozen")]
    AlreadyFrozen,

    #[error("Crop transform failed: {0}")]
    Transform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using Dermacap's Error
pub type Result<T> = std::result::Result<T, Error>;
