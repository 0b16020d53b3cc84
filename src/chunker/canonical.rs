//! Detection and structure-aware splitting of canonical public notices.
//!
//! The canonical format is the standardized multi-section contract notice:
//! a top-level announcement header, roman-numeral section headers, and
//! `d.d.)` sub-item numbering, usually accompanied by an official
//! registry number. Detection is a weighted heuristic; both the score and
//! the missing signals are logged so a misclassification can be diagnosed
//! from the logs alone.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::error::ChunkerError;
use super::generic::{accumulate_units, split_words};
use super::tokens::TokenCounter;

/// Announcement header bonus.
pub const HEADER_POINTS: u32 = 3;
/// Bonus per recognized required section (needs the header and at least two
/// distinct required sections to count).
pub const SECTION_POINTS: u32 = 2;
/// Registry-number bonus.
pub const REGISTRY_POINTS: u32 = 2;
/// Minimum distinct required sections before section points are credited.
pub const MIN_REQUIRED_SECTIONS: usize = 2;

/// The four section numerals a canonical notice is expected to carry.
pub const REQUIRED_SECTIONS: [&str; 4] = ["I", "II", "IV", "VI"];

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(?:contract|tender)\s+notice\b").expect("static regex")
});

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*section\s+([ivx]+)\b").expect("static regex")
});

static SUB_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\d+\.\)").expect("static regex"));

static REGISTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}/S\s?\d{3}-\d{6}\b").expect("static regex"));

/// Everything the detection heuristic observed about one document.
#[derive(Debug, Clone)]
pub struct CanonicalSignals {
    /// Weighted detection score.
    pub score: u32,
    /// Announcement header found.
    pub header_present: bool,
    /// Distinct required-section numerals found (subset of
    /// [`REQUIRED_SECTIONS`]).
    pub sections_found: Vec<String>,
    /// Count of `d.d.)` sub-item matches.
    pub sub_item_count: usize,
    /// Official registry number found.
    pub registry_present: bool,
    /// Human-readable descriptions of the absent signals.
    pub missing: Vec<String>,
}

impl CanonicalSignals {
    /// Whether `score` reaches the classification threshold.
    pub fn is_canonical(&self, threshold: u32) -> bool {
        self.score >= threshold
    }
}

/// Scores `text` against the canonical-notice heuristic.
///
/// Section headers only earn points beneath an announcement header: a bare
/// "Section II" line in an arbitrary document is not evidence of the
/// canonical form, so without the header the section signal is withheld and
/// reported as missing.
pub fn detect(text: &str) -> CanonicalSignals {
    let header_present = HEADER_RE.is_match(text);

    let sections_found: BTreeSet<String> = SECTION_RE
        .captures_iter(text)
        .map(|c| c[1].to_uppercase())
        .filter(|numeral| REQUIRED_SECTIONS.contains(&numeral.as_str()))
        .collect();

    let sub_item_count = SUB_ITEM_RE.find_iter(text).count();
    let registry_present = REGISTRY_RE.is_match(text);

    let mut score = 0;
    let mut missing = Vec::new();

    if header_present {
        score += HEADER_POINTS;
    } else {
        missing.push("announcement header".to_string());
    }

    if header_present && sections_found.len() >= MIN_REQUIRED_SECTIONS {
        score += SECTION_POINTS * sections_found.len() as u32;
    } else {
        missing.push(format!(
            "required section headers ({} of {} found{})",
            sections_found.len(),
            REQUIRED_SECTIONS.len(),
            if header_present { "" } else { ", not credited without header" },
        ));
    }

    score += match sub_item_count {
        0 => {
            missing.push("sub-item numbering".to_string());
            0
        }
        1..=2 => 1,
        3..=4 => 2,
        _ => 4,
    };

    if registry_present {
        score += REGISTRY_POINTS;
    } else {
        missing.push("registry number".to_string());
    }

    CanonicalSignals {
        score,
        header_present,
        sections_found: sections_found.into_iter().collect(),
        sub_item_count,
        registry_present,
        missing,
    }
}

/// Splits a canonical notice by top-level section, further dividing
/// oversized sections by sub-item numbering (word-level as a last resort).
pub fn chunk_canonical(
    text: &str,
    counter: &TokenCounter,
    max_tokens: usize,
) -> Result<Vec<String>, ChunkerError> {
    let mut chunks = Vec::new();

    for section in split_at_matches(text, &SECTION_RE) {
        if counter.count(section)? <= max_tokens {
            if !section.trim().is_empty() {
                chunks.push(section.to_string());
            }
            continue;
        }

        let sub_items = split_at_matches(section, &SUB_ITEM_RE);
        if sub_items.len() > 1 {
            debug!(
                sub_items = sub_items.len(),
                "section over budget, splitting by sub-item numbering"
            );
            chunks.extend(accumulate_units(&sub_items, counter, max_tokens)?);
        } else {
            debug!("section over budget with no sub-item numbering, splitting by words");
            chunks.extend(split_words(section, counter, max_tokens)?);
        }
    }

    Ok(chunks)
}

/// Splits `text` into contiguous slices starting at each match of `re`.
/// The leading slice before the first match is preserved, so concatenating
/// the slices reproduces `text` exactly.
fn split_at_matches<'t>(text: &'t str, re: &Regex) -> Vec<&'t str> {
    let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return vec![text];
    }

    let mut slices = Vec::with_capacity(starts.len() + 1);
    if starts[0] > 0 {
        slices.push(&text[..starts[0]]);
    }
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        slices.push(&text[start..end]);
    }
    slices
}
