// File: src/core/scorer.rs
use crate::config::MatchingConfig;
use crate::core::types::ProcessedName;
use crate::error::{MatchError, Result};

/// Outcome of one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// In [0, 1].
    pub similarity: f64,
    /// Levenshtein distance of the pair of forms that produced the best edit
    /// similarity. Smaller wins ties.
    pub edit_distance: usize,
}

/// Weighted blend of edit similarity and phonetic agreement.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    edit_weight: f64,
    phonetic_weight: f64,
    phonetic_partial: f64,
}

impl SimilarityScorer {
    pub fn new(edit_weight: f64, phonetic_weight: f64, phonetic_partial: f64) -> Result<Self> {
        if edit_weight < 0.0 || phonetic_weight < 0.0 {
            return Err(MatchError::validation("similarity weights must be non-negative"));
        }
        if (edit_weight + phonetic_weight - 1.0).abs() > 1e-6 {
            return Err(MatchError::validation("similarity weights must sum to 1.0"));
        }
        if !(0.0..=1.0).contains(&phonetic_partial) {
            return Err(MatchError::validation("phonetic_partial must lie in [0, 1]"));
        }
        Ok(Self { edit_weight, phonetic_weight, phonetic_partial })
    }

    pub fn from_config(config: &MatchingConfig) -> Result<Self> {
        Self::new(config.edit_weight, config.phonetic_weight, config.phonetic_partial)
    }

    pub fn score(&self, query: &ProcessedName, candidate: &ProcessedName) -> f64 {
        self.score_detailed(query, candidate).similarity
    }

    pub fn score_detailed(&self, query: &ProcessedName, candidate: &ProcessedName) -> Score {
        let (edit, edit_distance) = edit_similarity(query, candidate);
        let phonetic = phonetic_agreement(&query.phonetic, &candidate.phonetic, self.phonetic_partial);

        let similarity = if edit >= 1.0 && phonetic >= 1.0 {
            1.0
        } else {
            (self.edit_weight * edit + self.phonetic_weight * phonetic).clamp(0.0, 1.0)
        };
        Score { similarity, edit_distance }
    }
}

/// Percentage shown to an operator.
pub fn confidence(similarity: f64) -> u8 {
    (similarity.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// `1 - lev(a, b) / max(len a, len b)` over chars, clamped to [0, 1].
/// Two empty strings are identical.
pub fn normalized_edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = strsim::levenshtein(a, b);
    (1.0 - dist as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Best edit similarity over the same-script pairs (normalized, roman) and
/// their word-sorted forms, so "kumar suresh" still matches "suresh kumar".
fn edit_similarity(a: &ProcessedName, b: &ProcessedName) -> (f64, usize) {
    let pairs = [
        (a.normalized.clone(), b.normalized.clone()),
        (a.roman.clone(), b.roman.clone()),
        (sort_words(&a.normalized), sort_words(&b.normalized)),
        (sort_words(&a.roman), sort_words(&b.roman)),
    ];

    let mut best = (0.0_f64, usize::MAX);
    for (x, y) in &pairs {
        let sim = normalized_edit_similarity(x, y);
        let dist = strsim::levenshtein(x, y);
        if sim > best.0 || (sim == best.0 && dist < best.1) {
            best = (sim, dist);
        }
    }
    best
}

fn sort_words(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// 1.0 on identical codes, `partial` when the codes are one edit apart or when
/// every word code of one side occurs on the other, else 0.0.
pub fn phonetic_agreement(a: &str, b: &str, partial: f64) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if strsim::levenshtein(a, b) == 1 {
        return partial;
    }
    let words_a: Vec<&str> = a.split(' ').collect();
    let words_b: Vec<&str> = b.split(' ').collect();
    let (short, long) = if words_a.len() <= words_b.len() { (words_a, words_b) } else { (words_b, words_a) };
    if short.iter().all(|w| long.contains(w)) {
        return partial;
    }
    0.0
}
