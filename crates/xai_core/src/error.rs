//! Error types for xai_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur while building, laying out or exchanging explanations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The caller violated an input contract (empty batch, zero-sized image, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lengths or dimensions of related values disagree.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Decoding, encoding or resampling an image failed.
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
