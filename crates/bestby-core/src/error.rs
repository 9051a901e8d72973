//! Error types for the bestby-core library.
//!
//! The text engine itself is total and never produces these; they surface
//! from the OCR providers, image handling and configuration loading.

use thiserror::Error;

/// Main error type for the bestby library.
#[derive(Error, Debug)]
pub enum BestbyError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR providers and image preparation.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No OCR provider is configured.
    #[error("OCR provider not configured: {0}")]
    NotConfigured(String),

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider rejected the credentials.
    #[error("authentication failed (HTTP {0})")]
    Auth(u16),

    /// The provider answered with a non-success status.
    #[error("service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The provider response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

/// Result type for the bestby library.
pub type Result<T> = std::result::Result<T, BestbyError>;
