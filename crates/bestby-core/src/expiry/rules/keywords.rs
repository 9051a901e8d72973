//! Expiry keyword lexicon and anchor search.

use lazy_static::lazy_static;

/// Recognized expiry anchor phrases (English, French, Spanish).
pub const KEYWORD_LEXICON: &[&str] = &[
    // English
    "expiry date",
    "expiry",
    "exp",
    "best before",
    "use by",
    "bb",
    "ub",
    "best-before",
    "use-by",
    "expiry-date",
    "best:before",
    "use:by",
    "expiry:date",
    // French
    "date d'expiration",
    "date d'exp",
    "date d'exp.",
    "date d'exp:",
    "date d'expiry",
    "date d'expiry date",
    "date d'expiry-date",
    "date d'expirydate",
    "date d'expiry:date",
    "date d'expiration:",
    "date d'expiration.",
    "date d'expiration-",
    "date d'expiration date",
    "date d'expiration-date",
    "date d'expirationdate",
    "date d'expiration:date",
    "date d'expiration date:",
    "date d'expiration date.",
    "date d'expiration date-",
    "date d'expiration date date",
    "date d'expiration date-date",
    "date d'expiration datedate",
    "date d'expiration date:date",
    // Spanish
    "fecha de caducidad",
    "fecha de exp",
    "fecha de exp.",
    "fecha de exp:",
    "fecha de expiry",
    "fecha de expiry date",
    "fecha de expiry-date",
    "fecha de expirydate",
    "fecha de expiry:date",
    "fecha de caducidad:",
    "fecha de caducidad.",
    "fecha de caducidad-",
    "fecha de caducidad date",
    "fecha de caducidad-date",
    "fecha de caducidaddate",
    "fecha de caducidad:date",
    "fecha de caducidad date:",
    "fecha de caducidad date.",
    "fecha de caducidad date-",
    "fecha de caducidad date date",
    "fecha de caducidad date-date",
    "fecha de caducidad datedate",
    "fecha de caducidad date:date",
];

lazy_static! {
    /// Lexicon in lookup order: longest first, ties in declaration order.
    pub static ref KEYWORDS_BY_PRIORITY: Vec<&'static str> = by_priority(KEYWORD_LEXICON);
}

/// A keyword occurrence and the text that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor<'t> {
    /// Matched keyword.
    pub keyword: &'static str,
    /// Text after the keyword, leading separators stripped.
    pub suffix: &'t str,
}

/// Find expiry anchors in normalized text using the built-in lexicon.
pub fn find_anchors(text: &str) -> Vec<Anchor<'_>> {
    find_anchors_with(text, &KEYWORDS_BY_PRIORITY)
}

/// Find anchors for an already priority-ordered lexicon.
///
/// Each keyword contributes at most one anchor, at its first occurrence.
pub fn find_anchors_with<'t>(text: &'t str, keywords: &[&'static str]) -> Vec<Anchor<'t>> {
    keywords
        .iter()
        .filter_map(|&keyword| {
            let position = text.find(keyword)?;
            let suffix = strip_separators(&text[position + keyword.len()..]);
            Some(Anchor { keyword, suffix })
        })
        .collect()
}

/// Order a lexicon longest-first, dropping repeated phrases.
pub fn by_priority(lexicon: &[&'static str]) -> Vec<&'static str> {
    let mut keywords: Vec<&'static str> = Vec::with_capacity(lexicon.len());
    for &keyword in lexicon {
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    keywords
}

fn strip_separators(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '.' | ',' | ';' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_longest_first() {
        let keywords = &*KEYWORDS_BY_PRIORITY;
        let pos = |k: &str| keywords.iter().position(|x| *x == k).unwrap();

        assert!(pos("expiry date") < pos("expiry"));
        assert!(pos("expiry") < pos("exp"));
        assert!(pos("date d'expiration") < pos("date d'exp"));
        assert!(pos("best before") < pos("bb"));
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let ordered = by_priority(&["use by", "bb", "ub", "expiry"]);
        assert_eq!(ordered, vec!["use by", "expiry", "bb", "ub"]);
    }

    #[test]
    fn test_suffix_is_stripped() {
        let anchors = find_anchors("best before: 01/01/2030");
        assert_eq!(anchors[0].keyword, "best before");
        assert_eq!(anchors[0].suffix, "01/01/2030");
    }

    #[test]
    fn test_multilingual() {
        let anchors = find_anchors("date d'expiration: 15/06/2025");
        assert_eq!(anchors[0].keyword, "date d'expiration:");
        assert_eq!(anchors[0].suffix, "15/06/2025");
        assert_eq!(anchors[1].keyword, "date d'expiration");

        let anchors = find_anchors("fecha de caducidad 2026-03-01");
        assert_eq!(anchors[0].keyword, "fecha de caducidad");
        assert_eq!(anchors[0].suffix, "2026-03-01");
    }

    #[test]
    fn test_shorter_keywords_still_reported() {
        let keywords: Vec<&str> = find_anchors("expiry date 2025")
            .into_iter()
            .map(|a| a.keyword)
            .collect();
        assert_eq!(keywords, vec!["expiry date", "expiry", "exp"]);
    }

    #[test]
    fn test_no_keywords() {
        assert!(find_anchors("net wt 500g 12/2025").is_empty());
    }
}
