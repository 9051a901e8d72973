//! OCR misread correction and keyword canonicalization.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use tracing::trace;

/// Misread or variant surface forms and their canonical replacements.
///
/// One entry per surface form. Keys are matched against lower-cased text on
/// whole-word boundaries, longest first.
pub const CORRECTION_TABLE: &[(&str, &str)] = &[
    // Glyphs OCR confuses with Latin letters and punctuation
    ("マ", "m"),
    ("了", "l"),
    ("ー", "-"),
    ("つ", "t"),
    ("ⅵ", "6"),
    ("「", "("),
    ("’", "'"),
    // Common misreads of label words
    ("see", "exp"),
    ("beee", "date"),
    ("12ember", "december"),
    // Abbreviated month names
    ("jan", "january"),
    ("feb", "february"),
    ("mar", "march"),
    ("apr", "april"),
    ("jun", "june"),
    ("jul", "july"),
    ("aug", "august"),
    ("sep", "september"),
    ("oct", "october"),
    ("nov", "november"),
    ("dec", "december"),
    // Use by
    ("use-by", "use by"),
    ("useby", "use by"),
    ("use:by", "use by"),
    ("ub", "use by"),
    ("ub:", "use by"),
    ("ub.", "use by"),
    // Best before
    ("best-before", "best before"),
    ("bestbefore", "best before"),
    ("best:before", "best before"),
    ("bb", "best before"),
    ("bb:", "best before"),
    ("bb.", "best before"),
    // Expiry
    ("exp", "expiry"),
    ("exp.", "expiry"),
    ("exp:", "expiry"),
    ("expiry-date", "expiry date"),
    ("expirydate", "expiry date"),
    ("expiry:date", "expiry date"),
    // Year markers
    ("years", "year"),
    ("yr", "year"),
    ("yrs", "year"),
    // French
    ("date d'exp", "date d'expiration"),
    ("date d'exp.", "date d'expiration"),
    ("date d'exp:", "date d'expiration"),
    ("date d'expiry", "date d'expiration"),
    ("date d'expiry date", "date d'expiration"),
    ("date d'expiry-date", "date d'expiration"),
    ("date d'expirydate", "date d'expiration"),
    ("date d'expiry:date", "date d'expiration"),
    ("date d'expiration:", "date d'expiration"),
    ("date d'expiration.", "date d'expiration"),
    ("date d'expiration-", "date d'expiration"),
    ("date d'expiration date", "date d'expiration"),
    ("date d'expiration-date", "date d'expiration"),
    ("date d'expirationdate", "date d'expiration"),
    ("date d'expiration:date", "date d'expiration"),
    ("date d'expiration date:", "date d'expiration"),
    ("date d'expiration date.", "date d'expiration"),
    ("date d'expiration date-", "date d'expiration"),
    ("date d'expiration date date", "date d'expiration"),
    ("date d'expiration date-date", "date d'expiration"),
    ("date d'expiration datedate", "date d'expiration"),
    ("date d'expiration date:date", "date d'expiration"),
];

lazy_static! {
    static ref CORRECTIONS: Vec<(Regex, &'static str)> = {
        let mut entries: Vec<(&str, &str)> = CORRECTION_TABLE.to_vec();
        // Stable: equal lengths keep declaration order
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        entries
            .into_iter()
            .map(|(wrong, right)| {
                let pattern = format!(r"\b{}\b", regex::escape(wrong));
                (Regex::new(&pattern).unwrap(), right)
            })
            .collect()
    };
}

/// Join OCR lines with single spaces, lower-case, and apply corrections.
pub fn normalize<S: AsRef<str>>(lines: &[S]) -> String {
    let joined = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join(" ");

    correct_ocr_errors(&joined)
}

/// Lower-case `text` and apply the correction table until it is stable.
///
/// No replacement produces a form that maps back, so this reaches a fixed
/// point.
pub fn correct_ocr_errors(text: &str) -> String {
    let mut current = text.to_lowercase();

    loop {
        let next = apply_corrections(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_corrections(text: &str) -> String {
    let mut corrected = text.to_string();

    for (pattern, right) in CORRECTIONS.iter() {
        if pattern.is_match(&corrected) {
            trace!("correction {} -> {}", pattern.as_str(), right);
            corrected = pattern.replace_all(&corrected, NoExpand(right)).into_owned();
        }
    }

    corrected
}
