//! Keyword-anchored expiry date search with whole-text fallback.

use std::time::Instant;

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::expiry::{ExpiryMatch, ExtractionResult};

use super::rules::{
    concatenated::ConcatenatedDateExtractor, corrections::normalize, dates::StructuredDateExtractor,
    keywords::find_anchors, DateMatch, FieldExtractor,
};

/// Runs the extraction pipeline over one set of OCR lines.
///
/// Lines are normalized once. Each keyword anchor is then searched in
/// priority order, concatenated digits before structured patterns; the first
/// date found ends the search. When no anchor yields a date the same two
/// stages run over the whole normalized text.
#[derive(Debug, Clone)]
pub struct ExpiryDateParser {
    /// Whether to try run-together digits.
    concatenated_digits: bool,
    /// Whether to search the whole text when anchors fail.
    whole_text_fallback: bool,
}

impl ExpiryDateParser {
    /// Create a parser with every stage enabled.
    pub fn new() -> Self {
        Self {
            concatenated_digits: true,
            whole_text_fallback: true,
        }
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_concatenated_digits(config.concatenated_digits)
            .with_whole_text_fallback(config.whole_text_fallback)
    }

    /// Set concatenated-digit recovery.
    pub fn with_concatenated_digits(mut self, enabled: bool) -> Self {
        self.concatenated_digits = enabled;
        self
    }

    /// Set the whole-text fallback.
    pub fn with_whole_text_fallback(mut self, enabled: bool) -> Self {
        self.whole_text_fallback = enabled;
        self
    }

    /// Parse OCR lines.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> ExtractionResult {
        let start = start_timer();

        if lines.is_empty() {
            debug!("no OCR lines, nothing to search");
            return ExtractionResult::absent("", 0);
        }

        let text = normalize(lines);
        debug!("normalized text: {:?}", text);

        let expiry = self.search(&text);

        match &expiry {
            Some(found) => debug!(
                "expiry date {} via {} ({:?})",
                found.date, found.method, found.keyword
            ),
            None => debug!("no expiry date found"),
        }

        ExtractionResult {
            expiry,
            normalized_text: text,
            line_count: lines.len(),
            processing_time_us: start.map_or(0, |s| s.elapsed().as_micros() as u64),
        }
    }

    /// Parse a block of text, one OCR line per text line.
    pub fn parse_text(&self, text: &str) -> ExtractionResult {
        let lines: Vec<&str> = text.lines().collect();
        self.parse(&lines)
    }

    fn search(&self, text: &str) -> Option<ExpiryMatch> {
        for anchor in find_anchors(text) {
            debug!("text after {:?}: {:?}", anchor.keyword, anchor.suffix);

            if let Some(found) = self.search_candidate(anchor.suffix) {
                return Some(into_expiry(found, Some(anchor.keyword)));
            }
        }

        if !self.whole_text_fallback {
            return None;
        }

        debug!("no anchored date, searching whole text");
        self.search_candidate(text).map(|found| into_expiry(found, None))
    }

    fn search_candidate(&self, text: &str) -> Option<DateMatch> {
        if self.concatenated_digits {
            if let Some(found) = ConcatenatedDateExtractor::new().extract(text) {
                return Some(found);
            }
        }

        StructuredDateExtractor::new().extract(text)
    }
}

impl Default for ExpiryDateParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `Instant::now` panics on wasm32 without a clock, so timing is skipped there.
#[cfg(not(target_arch = "wasm32"))]
fn start_timer() -> Option<Instant> {
    Some(Instant::now())
}

#[cfg(target_arch = "wasm32")]
fn start_timer() -> Option<Instant> {
    None
}

fn into_expiry(found: DateMatch, keyword: Option<&str>) -> ExpiryMatch {
    ExpiryMatch {
        date: found.value,
        keyword: keyword.map(str::to_string),
        method: found.method,
        source: found.source,
        granularity: found.granularity,
    }
}
