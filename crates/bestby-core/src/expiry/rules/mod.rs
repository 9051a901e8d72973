//! Rule-based stages of the expiry date engine.

pub mod concatenated;
pub mod corrections;
pub mod dates;
pub mod keywords;
pub mod patterns;

pub use concatenated::{parse_concatenated, try_concatenated, ConcatenatedDateExtractor};
pub use corrections::{correct_ocr_errors, normalize, CORRECTION_TABLE};
pub use dates::{
    extract_date_from_text, Layout, PatternFamily, StructuredDateExtractor, DATE_PATTERN_SET,
};
pub use keywords::{find_anchors, find_anchors_with, Anchor, KEYWORD_LEXICON, KEYWORDS_BY_PRIORITY};

use chrono::NaiveDate;

use crate::models::expiry::{Granularity, MatchMethod};

/// Trait for date extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first acceptable value from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract every acceptable value, in priority order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A date recognized in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    /// Resolved date.
    pub value: NaiveDate,
    /// Stage that recognized it.
    pub method: MatchMethod,
    /// Printed precision.
    pub granularity: Granularity,
    /// Source text that was matched.
    pub source: String,
}

impl DateMatch {
    pub fn new(
        value: NaiveDate,
        method: MatchMethod,
        granularity: Granularity,
        source: impl Into<String>,
    ) -> Self {
        Self {
            value,
            method,
            granularity,
            source: source.into(),
        }
    }
}
