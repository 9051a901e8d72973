//! Structured date candidates and layout disambiguation.
//!
//! Candidates are searched family by family in [`DATE_PATTERN_SET`] order.
//! Within a family they are visited left to right; each candidate is tried
//! against the family's layouts in order and the first layout that parses
//! and passes the year window wins.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use super::patterns::*;
use super::{DateMatch, FieldExtractor};
use crate::models::expiry::{Granularity, MatchMethod, PatternKind};

/// Earliest accepted year.
pub const MIN_YEAR: i32 = 2000;

/// Latest accepted year.
pub const MAX_YEAR: i32 = 2100;

/// Two-digit years below this map to 20xx; the rest are rejected.
pub const SHORT_YEAR_PIVOT: u32 = 50;

/// A textual date template tried against a candidate substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `YYYY{sep}MM{sep}DD`
    YearMonthDay(char),
    /// `DD{sep}MM{sep}YYYY`
    DayMonthYear(char),
    /// `DD{sep}MM{sep}YY`
    DayMonthShortYear(char),
    /// `YY{sep}MM{sep}DD`
    ShortYearMonthDay(char),
    /// `December 25, 2024`
    MonthNameDayYear,
    /// `25 December 2024`
    DayMonthNameYear,
    /// `MM{sep}YYYY`
    MonthYear(char),
    /// `YYYY{sep}MM`
    YearMonth(char),
    /// `December 2024`
    MonthNameYear,
    /// `YYYY`
    Year,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    /// Exactly four digits.
    Year,
    /// Exactly two digits.
    ShortYear,
    /// One or two digits.
    Part,
}

impl Layout {
    /// Parse `candidate` with this layout and apply the disambiguation rules.
    pub fn parse(&self, candidate: &str) -> Option<(NaiveDate, Granularity)> {
        use Field::*;

        match *self {
            Layout::YearMonthDay(sep) => {
                let [y, m, d] = split_numeric(candidate, sep, [Year, Part, Part])?;
                day_date(full_year(y as i32)?, m, d)
            }
            Layout::DayMonthYear(sep) => {
                let [d, m, y] = split_numeric(candidate, sep, [Part, Part, Year])?;
                day_date(full_year(y as i32)?, m, d)
            }
            Layout::DayMonthShortYear(sep) => {
                let [d, m, y] = split_numeric(candidate, sep, [Part, Part, ShortYear])?;
                day_date(short_year(y)?, m, d)
            }
            Layout::ShortYearMonthDay(sep) => {
                let [y, m, d] = split_numeric(candidate, sep, [ShortYear, Part, Part])?;
                day_date(short_year(y)?, m, d)
            }
            Layout::MonthNameDayYear => {
                let caps = LAYOUT_MONTH_NAME_DAY_YEAR.captures(candidate)?;
                let month = month_number(&caps[1])?;
                let day: u32 = caps[2].parse().ok()?;
                day_date(printed_year(&caps[3])?, month, day)
            }
            Layout::DayMonthNameYear => {
                let caps = LAYOUT_DAY_MONTH_NAME_YEAR.captures(candidate)?;
                let day: u32 = caps[1].parse().ok()?;
                let month = month_number(&caps[2])?;
                day_date(printed_year(&caps[3])?, month, day)
            }
            Layout::MonthYear(sep) => {
                let [m, y] = split_numeric(candidate, sep, [Part, Year])?;
                month_date(full_year(y as i32)?, m)
            }
            Layout::YearMonth(sep) => {
                let [y, m] = split_numeric(candidate, sep, [Year, Part])?;
                month_date(full_year(y as i32)?, m)
            }
            Layout::MonthNameYear => {
                let caps = LAYOUT_MONTH_NAME_YEAR.captures(candidate)?;
                let month = month_number(&caps[1])?;
                let year: i32 = caps[2].parse().ok()?;
                month_date(full_year(year)?, month)
            }
            Layout::Year => {
                let [y] = split_numeric(candidate, ' ', [Year])?;
                let date = NaiveDate::from_ymd_opt(full_year(y as i32)?, 12, 31)?;
                Some((date, Granularity::Year))
            }
        }
    }
}

/// An ordered group of candidate patterns sharing one layout list.
pub struct PatternFamily {
    pub kind: PatternKind,
    pub patterns: Vec<&'static Regex>,
    pub layouts: Vec<Layout>,
}

const SEPARATORS: [char; 3] = ['-', '/', '.'];

lazy_static! {
    /// Pattern families in priority order. Full 4-digit years precede
    /// 2-digit years so a truncated year is never accepted.
    pub static ref DATE_PATTERN_SET: Vec<PatternFamily> = vec![
        PatternFamily {
            kind: PatternKind::FullNumeric,
            patterns: vec![&*DATE_YMD, &*DATE_DMY],
            layouts: SEPARATORS.iter().map(|&s| Layout::YearMonthDay(s))
                .chain(SEPARATORS.iter().map(|&s| Layout::DayMonthYear(s)))
                .collect(),
        },
        PatternFamily {
            kind: PatternKind::ShortYearNumeric,
            patterns: vec![&*DATE_DMY_SHORT, &*DATE_YMD_SHORT],
            layouts: SEPARATORS.iter().map(|&s| Layout::DayMonthShortYear(s))
                .chain(SEPARATORS.iter().map(|&s| Layout::ShortYearMonthDay(s)))
                .collect(),
        },
        PatternFamily {
            kind: PatternKind::MonthName,
            patterns: vec![&*DATE_MONTH_NAME_DAY, &*DATE_DAY_MONTH_NAME],
            layouts: vec![Layout::MonthNameDayYear, Layout::DayMonthNameYear],
        },
        PatternFamily {
            kind: PatternKind::MonthYear,
            patterns: vec![&*DATE_MY, &*DATE_YM, &*DATE_MONTH_NAME_YEAR],
            layouts: SEPARATORS.iter().map(|&s| Layout::MonthYear(s))
                .chain(SEPARATORS.iter().map(|&s| Layout::YearMonth(s)))
                .chain(std::iter::once(Layout::MonthNameYear))
                .collect(),
        },
        PatternFamily {
            kind: PatternKind::YearOnly,
            patterns: vec![&*DATE_YEAR],
            layouts: vec![Layout::Year],
        },
    ];
}

impl PatternFamily {
    /// Candidate substrings in text order; ties go to the earlier pattern.
    pub fn candidates<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut found: Vec<(usize, usize, usize, &'t str)> = Vec::new();

        for (index, pattern) in self.patterns.iter().enumerate() {
            for m in find_digit_bounded(pattern, text) {
                found.push((m.start(), index, m.end(), m.as_str()));
            }
        }

        found.sort_by_key(|&(start, index, _, _)| (start, index));
        found.dedup_by_key(|&mut (start, _, end, _)| (start, end));

        found.into_iter().map(|(_, _, _, source)| source).collect()
    }

    /// First layout that accepts `candidate`.
    pub fn parse(&self, candidate: &str) -> Option<(NaiveDate, Granularity)> {
        self.layouts.iter().find_map(|layout| {
            let parsed = layout.parse(candidate);
            if let Some((date, _)) = parsed {
                trace!("{:?} accepted {:?} as {}", layout, candidate, date);
            }
            parsed
        })
    }
}

/// Date extractor over the ordered pattern families.
pub struct StructuredDateExtractor;

impl StructuredDateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StructuredDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for StructuredDateExtractor {
    type Output = DateMatch;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.matches(text).next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.matches(text).collect()
    }
}

impl StructuredDateExtractor {
    fn matches<'t>(&self, text: &'t str) -> impl Iterator<Item = DateMatch> + 't {
        DATE_PATTERN_SET.iter().flat_map(move |family| {
            family
                .candidates(text)
                .into_iter()
                .filter_map(move |source| {
                    debug!("{} candidate: {:?}", family.kind, source);
                    let Some((date, granularity)) = family.parse(source) else {
                        debug!("{} candidate {:?} rejected", family.kind, source);
                        return None;
                    };
                    Some(DateMatch::new(
                        date,
                        MatchMethod::Pattern(family.kind),
                        granularity,
                        source,
                    ))
                })
        })
    }
}

/// First date found by the structured pattern families.
pub fn extract_date_from_text(text: &str) -> Option<NaiveDate> {
    StructuredDateExtractor::new().extract(text).map(|m| m.value)
}

/// Accept a four-digit year inside the supported window.
pub(crate) fn full_year(year: i32) -> Option<i32> {
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

/// Map a two-digit year to 20xx; years at or past the pivot are rejected.
pub(crate) fn short_year(year: u32) -> Option<i32> {
    (year < SHORT_YEAR_PIVOT).then(|| 2000 + year as i32)
}

fn printed_year(digits: &str) -> Option<i32> {
    let year: u32 = digits.parse().ok()?;
    match digits.len() {
        2 => short_year(year),
        4 => full_year(year as i32),
        _ => None,
    }
}

fn day_date(year: i32, month: u32, day: u32) -> Option<(NaiveDate, Granularity)> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, Granularity::Day))
}

fn month_date(year: i32, month: u32) -> Option<(NaiveDate, Granularity)> {
    last_day_of_month(year, month).map(|d| (d, Granularity::Month))
}

/// Last calendar day of a month: the day before the first of the next month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Split on `sep` into exactly `N` digit fields of the given widths.
fn split_numeric<const N: usize>(
    candidate: &str,
    sep: char,
    widths: [Field; N],
) -> Option<[u32; N]> {
    let mut values = [0u32; N];
    let mut parts = candidate.split(sep);

    for (slot, width) in values.iter_mut().zip(widths) {
        let part = parts.next()?;
        let len_ok = match width {
            Field::Year => part.len() == 4,
            Field::ShortYear => part.len() == 2,
            Field::Part => (1..=2).contains(&part.len()),
        };
        if !len_ok || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn first(text: &str) -> Option<DateMatch> {
        StructuredDateExtractor::new().extract(text)
    }

    #[test]
    fn test_full_numeric_both_orders() {
        assert_eq!(extract_date_from_text("2025-03-14"), Some(date(2025, 3, 14)));
        assert_eq!(extract_date_from_text("14.03.2025"), Some(date(2025, 3, 14)));
        assert_eq!(extract_date_from_text("14/3/2025"), Some(date(2025, 3, 14)));
    }

    #[test]
    fn test_full_year_before_short_year() {
        let m = first("31/12/2024").unwrap();
        assert_eq!(m.value, date(2024, 12, 31));
        assert_eq!(m.method, MatchMethod::Pattern(PatternKind::FullNumeric));
        assert_eq!(m.source, "31/12/2024");
    }

    #[test]
    fn test_short_year() {
        let m = first("31.12.24").unwrap();
        assert_eq!(m.value, date(2024, 12, 31));
        assert_eq!(m.method, MatchMethod::Pattern(PatternKind::ShortYearNumeric));
    }

    #[test]
    fn test_short_year_pivot() {
        assert_eq!(extract_date_from_text("01/02/49"), Some(date(2049, 2, 1)));
        assert_eq!(extract_date_from_text("01/02/50"), None);
        assert_eq!(extract_date_from_text("01/02/98"), None);
    }

    #[test]
    fn test_year_first_short_layout_when_day_first_fails() {
        // Feb 30 is impossible day-first, so YY/MM/DD is used
        assert_eq!(extract_date_from_text("30/02/24"), Some(date(2030, 2, 24)));
    }

    #[test]
    fn test_mixed_separators_not_full_numeric() {
        // No full-date layout takes mixed separators; "12.2024" still reads as month/year
        let m = first("31/12.2024").unwrap();
        assert_eq!(m.method, MatchMethod::Pattern(PatternKind::MonthYear));
        assert_eq!(m.source, "12.2024");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(extract_date_from_text("december 25, 2024"), Some(date(2024, 12, 25)));
        assert_eq!(extract_date_from_text("december 25th 2024"), Some(date(2024, 12, 25)));
        assert_eq!(extract_date_from_text("sept 3, 26"), Some(date(2026, 9, 3)));
        assert_eq!(extract_date_from_text("25 december 2024"), Some(date(2024, 12, 25)));
    }

    #[test]
    fn test_month_year_resolves_to_last_day() {
        let m = first("02/2024").unwrap();
        assert_eq!(m.value, date(2024, 2, 29));
        assert_eq!(m.granularity, Granularity::Month);

        assert_eq!(extract_date_from_text("04/2023"), Some(date(2023, 4, 30)));
        assert_eq!(extract_date_from_text("2023.11"), Some(date(2023, 11, 30)));
        assert_eq!(extract_date_from_text("december 2030"), Some(date(2030, 12, 31)));
    }

    #[test]
    fn test_year_only() {
        let m = first("2025").unwrap();
        assert_eq!(m.value, date(2025, 12, 31));
        assert_eq!(m.granularity, Granularity::Year);
        assert_eq!(m.method, MatchMethod::Pattern(PatternKind::YearOnly));
    }

    #[test]
    fn test_out_of_range_years_skipped() {
        assert_eq!(extract_date_from_text("15/06/1998"), None);
        assert_eq!(extract_date_from_text("15/06/2150"), None);
        assert_eq!(
            extract_date_from_text("made 15/06/1998 exp 15/06/2026"),
            Some(date(2026, 6, 15))
        );
        assert_eq!(extract_date_from_text("lot 1998 exp 2027"), Some(date(2027, 12, 31)));
    }

    #[test]
    fn test_leftmost_within_family() {
        assert_eq!(
            extract_date_from_text("01/01/2030 packed 2024-05-01"),
            Some(date(2030, 1, 1))
        );
    }

    #[test]
    fn test_family_priority_over_position() {
        // A bare year earlier in the text loses to a full date later
        assert_eq!(
            extract_date_from_text("since 2001 best 2026-01-31"),
            Some(date(2026, 1, 31))
        );
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 12), Some(date(2024, 12, 31)));
        assert_eq!(last_day_of_month(2100, 2), Some(date(2100, 2, 28)));
        assert_eq!(last_day_of_month(2024, 13), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(extract_date_from_text("net wt 500 g"), None);
        assert_eq!(extract_date_from_text(""), None);
    }

    #[test]
    fn test_extract_all_in_priority_order() {
        let all = StructuredDateExtractor::new().extract_all("2026 and 03/2027 and 01.02.2028");
        let dates: Vec<NaiveDate> = all.iter().map(|m| m.value).collect();
        assert_eq!(
            dates,
            vec![
                date(2028, 2, 1),
                date(2027, 3, 31),
                date(2028, 2, 29),
                date(2026, 12, 31),
                date(2027, 12, 31),
                date(2028, 12, 31),
            ]
        );
    }
}
