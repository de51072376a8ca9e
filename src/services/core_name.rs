//! Title normalization used to detect entries of the same series.

use regex::Regex;
use std::sync::OnceLock;

struct CorePatterns {
    separators: Regex,
    markers: Regex,
    ordinals: Regex,
    numerals: Regex,
    punctuation: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static CorePatterns {
    static PATTERNS: OnceLock<CorePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CorePatterns {
        separators: Regex::new(r"[:\-–—()\[\]]").expect("valid separator pattern"),
        markers: Regex::new(
            r"\b(season|part|movie|ova|special|remake|final|chapter|edition|arc|rebuild|stage|act|sequel|prequel|series)\b",
        )
        .expect("valid marker pattern"),
        ordinals: Regex::new(r"\b\d+(st|nd|rd|th)\b").expect("valid ordinal pattern"),
        numerals: Regex::new(r"\b(\d+|i{1,3}|iv|vi{0,3}|ix|x)\b").expect("valid numeral pattern"),
        punctuation: Regex::new(r"[^\w\s]").expect("valid punctuation pattern"),
        whitespace: Regex::new(r"\s+").expect("valid whitespace pattern"),
    })
}

/// Reduces a title to its series core: `"Attack on Titan Season 3 Part 2"`
/// becomes `"attack on titan"`.
///
/// The title is cut at the first separator, then season/part/sequel markers,
/// ordinals, integers and Roman numerals up to `x` are removed.
pub fn extract_core_name(title: &str) -> String {
    let p = patterns();
    let lowered = title.to_lowercase();
    let head = p.separators.split(&lowered).next().unwrap_or_default();

    let stripped = p.markers.replace_all(head, " ");
    let stripped = p.ordinals.replace_all(&stripped, " ");
    let stripped = p.numerals.replace_all(&stripped, " ");
    let stripped = p.punctuation.replace_all(&stripped, " ");

    p.whitespace.replace_all(&stripped, " ").trim().to_string()
}
