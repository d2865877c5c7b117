// src/matching/substring.rs

use crate::models::{Entity, MatchMethod, MatchResult};
use crate::normalize::fold_case;

use super::MatchStrategy;

/// Case-insensitive literal containment of the query inside a candidate name.
///
/// Only the query-in-candidate direction is tested: "Acme" finds "Acme Corp",
/// "Acme Corporation" does not find "Acme Corp".
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl SubstringMatcher {
    /// First candidate (in set order) whose name contains `needle`.
    pub fn find_containing<'a>(needle: &str, candidates: &'a [Entity]) -> Option<&'a Entity> {
        let needle = fold_case(needle);
        candidates
            .iter()
            .find(|c| fold_case(&c.name).contains(&needle))
    }
}

impl MatchStrategy for SubstringMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Substring
    }

    fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult> {
        Self::find_containing(query, candidates)
            .map(|c| MatchResult::matched(c.id.clone(), MatchMethod::Substring))
    }
}
