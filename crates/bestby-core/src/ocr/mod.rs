//! OCR collaborators: image preprocessing and text recognition providers.

pub mod preprocessing;

#[cfg(feature = "azure")]
mod azure;

#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::ImagePreprocessor;

#[cfg(feature = "azure")]
pub use azure::AzureOcrClient;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use crate::error::OcrError;

/// A text recognition backend.
///
/// Implementations take encoded image bytes and return the detected text
/// lines in reading order. An empty vector means no text was found.
pub trait OcrProvider {
    /// Short provider name for logs and reports.
    fn name(&self) -> &str;

    /// Recognize printed text in an encoded image.
    fn recognize(&self, image: &[u8]) -> Result<Vec<String>, OcrError>;
}
