//! Recovery of dates whose separators were lost by OCR (`31122024`).

use chrono::NaiveDate;
use tracing::debug;

use super::dates::{full_year, MAX_YEAR, MIN_YEAR};
use super::patterns::DIGIT_RUN;
use super::{DateMatch, FieldExtractor};
use crate::models::expiry::{Granularity, MatchMethod};

/// Extractor for run-together `DDMMYYYY` digits.
pub struct ConcatenatedDateExtractor;

impl ConcatenatedDateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConcatenatedDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ConcatenatedDateExtractor {
    type Output = DateMatch;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.matches(text).next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.matches(text).collect()
    }
}

impl ConcatenatedDateExtractor {
    fn matches<'t>(&self, text: &'t str) -> impl Iterator<Item = DateMatch> + 't {
        DIGIT_RUN
            .find_iter(text)
            .filter(|run| matches!(run.as_str().len(), 8 | 10))
            .filter_map(|run| {
                let date = parse_concatenated(run.as_str())?;
                debug!("concatenated digits {} -> {}", run.as_str(), date);
                Some(DateMatch::new(
                    date,
                    MatchMethod::Concatenated,
                    Granularity::Day,
                    run.as_str(),
                ))
            })
    }
}

/// First run of 8 or 10 digits in `text` that reads as a valid date.
pub fn try_concatenated(text: &str) -> Option<NaiveDate> {
    ConcatenatedDateExtractor::new().extract(text).map(|m| m.value)
}

/// Read an 8- or 10-digit run as day (2), month (2), year (rest).
pub fn parse_concatenated(digits: &str) -> Option<NaiveDate> {
    if !matches!(digits.len(), 8 | 10) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let day: u32 = digits[..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let year: u64 = digits[4..].parse().ok()?;

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    if year < MIN_YEAR as u64 || year > MAX_YEAR as u64 {
        return None;
    }

    NaiveDate::from_ymd_opt(full_year(year as i32)?, month, day)
}
