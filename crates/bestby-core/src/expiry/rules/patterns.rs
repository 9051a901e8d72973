//! Common regex patterns for expiry date extraction.
//!
//! All patterns run against normalized (lower-cased) text.

use lazy_static::lazy_static;
use regex::{Match, Regex};

/// Full or abbreviated English month name.
const MONTH: &str = concat!(
    r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?",
    r"|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)",
);

const ORDINAL: &str = r"(?:st|nd|rd|th)?";

lazy_static! {
    // Maximal digit runs, for the concatenated DDMMYYYY heuristic
    pub static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();

    // Full numeric, 4-digit year
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\d{4}[./\-]\d{1,2}[./\-]\d{1,2}"
    ).unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(
        r"\d{1,2}[./\-]\d{1,2}[./\-]\d{4}"
    ).unwrap();

    // Numeric, 2-digit year
    pub static ref DATE_DMY_SHORT: Regex = Regex::new(
        r"\d{1,2}[./\-]\d{1,2}[./\-]\d{2}"
    ).unwrap();

    pub static ref DATE_YMD_SHORT: Regex = Regex::new(
        r"\d{2}[./\-]\d{1,2}[./\-]\d{2}"
    ).unwrap();

    // Month name: "december 25, 2024" / "25th december 2024"
    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(&format!(
        r"\b{MONTH}\s+\d{{1,2}}{ORDINAL},?\s+\d{{2,4}}"
    )).unwrap();

    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(&format!(
        r"\b\d{{1,2}}{ORDINAL}\s+{MONTH},?\s+\d{{2,4}}"
    )).unwrap();

    // Month and year only
    pub static ref DATE_MY: Regex = Regex::new(
        r"\d{1,2}[./\-]\d{4}"
    ).unwrap();

    pub static ref DATE_YM: Regex = Regex::new(
        r"\d{4}[./\-]\d{1,2}"
    ).unwrap();

    pub static ref DATE_MONTH_NAME_YEAR: Regex = Regex::new(&format!(
        r"\b{MONTH}\s+\d{{4}}"
    )).unwrap();

    // Bare year
    pub static ref DATE_YEAR: Regex = Regex::new(
        r"\b\d{4}\b"
    ).unwrap();

    // Anchored layouts for month-name candidates
    pub static ref LAYOUT_MONTH_NAME_DAY_YEAR: Regex = Regex::new(&format!(
        r"^({MONTH})\s+(\d{{1,2}}){ORDINAL},?\s+(\d{{2}}|\d{{4}})$"
    )).unwrap();

    pub static ref LAYOUT_DAY_MONTH_NAME_YEAR: Regex = Regex::new(&format!(
        r"^(\d{{1,2}}){ORDINAL}\s+({MONTH}),?\s+(\d{{2}}|\d{{4}})$"
    )).unwrap();

    pub static ref LAYOUT_MONTH_NAME_YEAR: Regex = Regex::new(&format!(
        r"^({MONTH})\s+(\d{{4}})$"
    )).unwrap();
}

/// Find all matches of `pattern` that are not glued to neighbouring digits.
///
/// A match whose first (last) character is a digit must not be preceded
/// (followed) by another digit, so `15/06/1998` never yields `15/06/19`.
pub fn find_digit_bounded<'t>(pattern: &Regex, text: &'t str) -> Vec<Match<'t>> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(m) = pattern.find_at(text, pos) else {
            break;
        };

        if is_digit_bounded(text, m.start(), m.end()) {
            matches.push(m);
            pos = if m.end() > m.start() { m.end() } else { m.end() + 1 };
        } else {
            // Retry from the next character boundary after the rejected start
            pos = m.start()
                + text[m.start()..]
                    .chars()
                    .next()
                    .map(char::len_utf8)
                    .unwrap_or(1);
        }
    }

    matches
}

fn is_digit_bounded(text: &str, start: usize, end: usize) -> bool {
    let span = &text[start..end];
    let starts_with_digit = span.chars().next().is_some_and(|c| c.is_ascii_digit());
    let ends_with_digit = span.chars().next_back().is_some_and(|c| c.is_ascii_digit());

    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !(starts_with_digit && before.is_some_and(|c| c.is_ascii_digit()))
        && !(ends_with_digit && after.is_some_and(|c| c.is_ascii_digit()))
}
