//! Core library for reading printed expiry dates off product labels.
//!
//! This crate provides:
//! - A pure text engine turning noisy OCR lines into a single calendar date
//!   (normalization, multilingual keyword anchoring, concatenated-digit
//!   recovery, ordered date pattern search)
//! - Image preprocessing to improve OCR legibility
//! - OCR providers (Azure Computer Vision, local ONNX models)
//! - [`DateOcrService`], the image-in, ISO-date-out facade

pub mod error;
pub mod expiry;
pub mod models;
pub mod ocr;
pub mod service;

pub use error::{BestbyError, OcrError, Result};
pub use expiry::{extract_expiry_date, ExpiryDateParser};
pub use models::config::BestbyConfig;
pub use models::expiry::{ExpiryMatch, ExtractionResult, Granularity, MatchMethod, PatternKind};
pub use ocr::{ImagePreprocessor, OcrProvider};
pub use service::DateOcrService;

#[cfg(feature = "azure")]
pub use ocr::AzureOcrClient;

#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
