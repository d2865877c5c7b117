// src/matching/exact.rs

use crate::models::{Entity, MatchMethod, MatchResult};

use super::MatchStrategy;

/// Case-sensitive equality on the candidate name, against the query as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatcher;

impl MatchStrategy for ExactMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Exact
    }

    fn uses_raw_query(&self) -> bool {
        true
    }

    fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult> {
        candidates
            .iter()
            .find(|c| c.name == query)
            .map(|c| MatchResult::matched(c.id.clone(), MatchMethod::Exact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_is_case_sensitive() {
        let candidates = vec![Entity::new("1", "acme"), Entity::new("2", "Acme")];
        let result = ExactMatcher.attempt_match("Acme", &candidates).unwrap();
        assert_eq!(result.matched_id.unwrap().as_str(), "2");
        assert!(ExactMatcher.attempt_match("ACME", &candidates).is_none());
    }

    #[test]
    fn test_exact_takes_first_duplicate() {
        let candidates = vec![Entity::new("1", "티벌컨"), Entity::new("2", "티벌컨")];
        let result = ExactMatcher.attempt_match("티벌컨", &candidates).unwrap();
        assert_eq!(result.matched_id.unwrap().as_str(), "1");
        assert_eq!(result.confidence, None);
    }
}
