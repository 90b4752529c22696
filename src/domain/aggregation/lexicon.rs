//! Fixed negative lexicon for keyword-hit aggregation.

use once_cell::sync::Lazy;

/// Terms that count as negative-lexicon hits when they appear in note text.
///
/// Matching is case-insensitive on the lowercased input. The set is fixed at
/// compile time; trigger scoring treats hit frequency as a tunable signal,
/// not the lexicon itself.
pub static NEGATIVE_LEXICON: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "exhausted",
        "overwhelmed",
        "burned out",
        "burnt out",
        "hopeless",
        "worthless",
        "pointless",
        "drained",
        "give up",
        "giving up",
        "can't cope",
        "no energy",
    ]
});

/// Scans a note for negative-lexicon terms, returning one entry per match.
///
/// A term occurring twice yields two entries. Output order follows the
/// lexicon, so results are deterministic for identical input.
pub fn scan_for_negative_terms(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let mut hits = Vec::new();
    for term in NEGATIVE_LEXICON.iter() {
        let count = lowered.matches(term).count();
        for _ in 0..count {
            hits.push(*term);
        }
    }
    hits
}
