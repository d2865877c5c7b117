// src/matching/fuzzy.rs

use log::trace;
use rapidfuzz::fuzz;

use crate::config::MIN_FUZZY_RATIO;
use crate::models::{Entity, MatchMethod, MatchResult};

use super::MatchStrategy;

/// Similarity of two strings on a 0-100 scale.
///
/// `rapidfuzz::fuzz::ratio` over the character sequences (insert/delete edit
/// distance, normalized by the combined length), scaled to 100 and rounded
/// half to even. An empty side scores 0.
pub fn fuzzy_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let similarity = fuzz::ratio(a.chars(), b.chars());
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Picks the candidate with the highest `fuzzy_ratio` and accepts it if the
/// ratio reaches `min_ratio`. Ties go to the earliest candidate.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    min_ratio: u8,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        FuzzyMatcher {
            min_ratio: MIN_FUZZY_RATIO,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(min_ratio: u8) -> Self {
        FuzzyMatcher { min_ratio }
    }

    pub fn min_ratio(&self) -> u8 {
        self.min_ratio
    }

    /// Best candidate and its ratio, regardless of the cutoff.
    pub fn best_candidate<'a>(query: &str, candidates: &'a [Entity]) -> Option<(&'a Entity, u8)> {
        let mut best: Option<(&Entity, u8)> = None;
        for candidate in candidates {
            let ratio = fuzzy_ratio(query, &candidate.name);
            if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
                best = Some((candidate, ratio));
                if ratio == 100 {
                    break;
                }
            }
        }
        best
    }
}

impl MatchStrategy for FuzzyMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Fuzzy
    }

    fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult> {
        let (candidate, ratio) = Self::best_candidate(query, candidates)?;
        trace!(
            "Best fuzzy candidate for '{}' is '{}' (id {}) at ratio {}",
            query, candidate.name, candidate.id, ratio
        );
        if ratio >= self.min_ratio {
            Some(MatchResult::matched(candidate.id.clone(), MatchMethod::Fuzzy).with_confidence(ratio))
        } else {
            None
        }
    }
}
