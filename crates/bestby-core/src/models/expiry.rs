//! Expiry date extraction result model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result of running the text engine over one set of OCR lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The recovered date, if any.
    pub expiry: Option<ExpiryMatch>,

    /// Text after joining and correction, as seen by the search stages.
    pub normalized_text: String,

    /// Number of OCR lines received.
    pub line_count: usize,

    /// Time spent in the engine, in microseconds.
    pub processing_time_us: u64,
}

impl ExtractionResult {
    /// A result with nothing found.
    pub fn absent(normalized_text: impl Into<String>, line_count: usize) -> Self {
        Self {
            expiry: None,
            normalized_text: normalized_text.into(),
            line_count,
            processing_time_us: 0,
        }
    }

    /// Whether a date was recovered.
    pub fn is_found(&self) -> bool {
        self.expiry.is_some()
    }

    /// The recovered calendar date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.expiry.as_ref().map(|m| m.date)
    }

    /// The recovered date formatted as `YYYY-MM-DD`.
    pub fn iso_date(&self) -> Option<String> {
        self.date().map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// A date recovered from label text, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryMatch {
    /// Resolved calendar date.
    pub date: NaiveDate,

    /// Anchor keyword the date followed; `None` for the whole-text fallback.
    pub keyword: Option<String>,

    /// How the date was recognized.
    pub method: MatchMethod,

    /// Substring the date was parsed from.
    pub source: String,

    /// Precision printed on the label.
    pub granularity: Granularity,
}

/// Stage that recognized a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "pattern")]
pub enum MatchMethod {
    /// Run-together `DDMMYYYY` digits.
    Concatenated,
    /// One of the structured date pattern families.
    Pattern(PatternKind),
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Concatenated => write!(f, "concatenated"),
            MatchMethod::Pattern(kind) => write!(f, "pattern:{}", kind),
        }
    }
}

/// Structured date pattern families, in search priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// `YYYY-MM-DD` or `DD-MM-YYYY`.
    FullNumeric,
    /// `DD-MM-YY` or `YY-MM-DD`.
    ShortYearNumeric,
    /// `December 25, 2024` or `25 December 2024`.
    MonthName,
    /// `MM/YYYY`, `YYYY/MM` or `December 2024`.
    MonthYear,
    /// Bare `YYYY`.
    YearOnly,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::FullNumeric => "full_numeric",
            PatternKind::ShortYearNumeric => "short_year_numeric",
            PatternKind::MonthName => "month_name",
            PatternKind::MonthYear => "month_year",
            PatternKind::YearOnly => "year_only",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precision of a printed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Full day, month and year were printed.
    Day,
    /// Month and year only; resolved to the last day of the month.
    Month,
    /// Year only; resolved to December 31.
    Year,
}
