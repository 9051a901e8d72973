//! Expiry date extraction from OCR text.

mod parser;
pub mod rules;

pub use parser::ExpiryDateParser;

/// Extract an expiry date from OCR lines as `YYYY-MM-DD`.
pub fn extract_expiry_date<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    ExpiryDateParser::new().parse(lines).iso_date()
}
