//! WASM bindings for expiry date extraction.
//!
//! OCR runs in the page (or elsewhere); these bindings take the recognized
//! lines and return the expiry date.

use wasm_bindgen::prelude::*;

use bestby_core::expiry::rules::{extract_date_from_text, normalize};
use bestby_core::{ExpiryDateParser, ExtractionResult};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Normalize OCR text the way the extractor sees it.
#[wasm_bindgen]
pub fn normalize_text(text: &str) -> String {
    normalize(&split_lines(text))
}

/// Extract the expiry date from an array of OCR lines.
///
/// Returns `YYYY-MM-DD`, or `undefined` when no date is found. Non-string
/// array entries are skipped.
#[wasm_bindgen]
pub fn extract_expiry_date(lines: js_sys::Array) -> Option<String> {
    let lines = array_to_lines(&lines);
    ExpiryDateParser::new().parse(&lines).iso_date()
}

/// Extract the expiry date from newline-separated OCR text.
#[wasm_bindgen]
pub fn extract_expiry_date_from_text(text: &str) -> Option<String> {
    ExpiryDateParser::new().parse(&split_lines(text)).iso_date()
}

/// Parse the first date in a string, without keyword anchoring.
#[wasm_bindgen]
pub fn parse_date(text: &str) -> Option<String> {
    extract_date_from_text(&normalize(&[text])).map(|d| d.format("%Y-%m-%d").to_string())
}

fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

fn array_to_lines(lines: &js_sys::Array) -> Vec<String> {
    lines.iter().filter_map(|v| v.as_string()).collect()
}

fn to_js(result: &ExtractionResult) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Expiry date extractor class for browser use.
#[wasm_bindgen]
pub struct ExpiryExtractor {
    parser: ExpiryDateParser,
}

#[wasm_bindgen]
impl ExpiryExtractor {
    /// Create an extractor with every stage enabled.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: ExpiryDateParser::new(),
        }
    }

    /// Search the whole text when no keyword yields a date.
    #[wasm_bindgen]
    pub fn set_whole_text_fallback(&mut self, enabled: bool) {
        self.parser = self.parser.clone().with_whole_text_fallback(enabled);
    }

    /// Recover run-together `DDMMYYYY` digits.
    #[wasm_bindgen]
    pub fn set_concatenated_digits(&mut self, enabled: bool) {
        self.parser = self.parser.clone().with_concatenated_digits(enabled);
    }

    /// Extract the expiry date from OCR lines.
    #[wasm_bindgen]
    pub fn extract(&self, lines: js_sys::Array) -> Option<String> {
        self.parser.parse(&array_to_lines(&lines)).iso_date()
    }

    /// Extract with keyword, method and normalized text.
    #[wasm_bindgen]
    pub fn extract_with_details(&self, lines: js_sys::Array) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(&array_to_lines(&lines)))
    }
}

impl Default for ExpiryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines collected from a browser-side OCR library.
#[wasm_bindgen]
pub struct OcrLinesJs {
    lines: Vec<String>,
}

#[wasm_bindgen]
impl OcrLinesJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append one recognized line.
    #[wasm_bindgen]
    pub fn add_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    /// Number of collected lines.
    #[wasm_bindgen]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[wasm_bindgen]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines joined with newlines.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Extract the expiry date from the collected lines.
    #[wasm_bindgen]
    pub fn extract(&self) -> Option<String> {
        ExpiryDateParser::new().parse(&self.lines).iso_date()
    }
}

impl Default for OcrLinesJs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn array(lines: &[&str]) -> js_sys::Array {
        lines.iter().map(|l| JsValue::from_str(l)).collect()
    }

    #[wasm_bindgen_test]
    fn test_extract_expiry_date() {
        assert_eq!(
            extract_expiry_date(array(&["NET WT 500g", "EXP 02/2024"])),
            Some("2024-02-29".to_string())
        );
        assert_eq!(extract_expiry_date(array(&[])), None);
    }

    #[wasm_bindgen_test]
    fn test_extract_from_text() {
        assert_eq!(
            extract_expiry_date_from_text("Best before\n31/12/2024"),
            Some("2024-12-31".to_string())
        );
    }

    #[wasm_bindgen_test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("BEST BEFORE\nDEC 2025"), "best before december 2025");
    }

    #[wasm_bindgen_test]
    fn test_parse_date() {
        assert_eq!(parse_date("lot 12.08.2026"), Some("2026-08-12".to_string()));
        assert_eq!(parse_date("no date"), None);
    }

    #[wasm_bindgen_test]
    fn test_extractor_fallback_toggle() {
        let mut extractor = ExpiryExtractor::new();
        assert_eq!(
            extractor.extract(array(&["lot 12.08.2026"])),
            Some("2026-08-12".to_string())
        );

        extractor.set_whole_text_fallback(false);
        assert_eq!(extractor.extract(array(&["lot 12.08.2026"])), None);
    }

    #[wasm_bindgen_test]
    fn test_extract_with_details() {
        let details = ExpiryExtractor::new()
            .extract_with_details(array(&["USE BY 31122024"]))
            .unwrap();

        let expiry = js_sys::Reflect::get(&details, &JsValue::from_str("expiry")).unwrap();
        let keyword = js_sys::Reflect::get(&expiry, &JsValue::from_str("keyword")).unwrap();
        assert_eq!(keyword.as_string(), Some("use by".to_string()));

        // No clock on wasm32, so timing reads zero instead of panicking
        let time =
            js_sys::Reflect::get(&details, &JsValue::from_str("processing_time_us")).unwrap();
        assert_eq!(time.as_f64(), Some(0.0));
    }

    #[wasm_bindgen_test]
    fn test_ocr_lines() {
        let mut lines = OcrLinesJs::new();
        assert!(lines.is_empty());
        lines.add_line("USE BY");
        lines.add_line("31122024");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.get_text(), "USE BY\n31122024");
        assert_eq!(lines.extract(), Some("2024-12-31".to_string()));
    }
}
