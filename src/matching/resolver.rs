// src/matching/resolver.rs

use log::{debug, trace};

use crate::config::{COMPANY_KEYWORD_MAX_LEN, KEYWORD_MAX_LEN, KEYWORD_MIN_LEN, MIN_FUZZY_RATIO};
use crate::error::MatchError;
use crate::models::{Entity, MatchMethod, MatchResult};
use crate::normalize::clean_query;

use super::{ExactMatcher, FuzzyMatcher, KeywordMatcher, MatchStrategy, SubstringMatcher};

/// Resolves a query name against a candidate set by trying each strategy in
/// order and returning the first hit. Scores are never blended across stages.
pub struct MatchResolver {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl Default for MatchResolver {
    /// Exact, substring, fuzzy (ratio >= 70), keyword (2..=6 chars).
    fn default() -> Self {
        MatchResolver::cascade(FuzzyMatcher::default(), KeywordMatcher::default())
    }
}

impl MatchResolver {
    fn cascade(fuzzy: FuzzyMatcher, keyword: KeywordMatcher) -> Self {
        MatchResolver {
            strategies: vec![
                Box::new(ExactMatcher),
                Box::new(SubstringMatcher),
                Box::new(fuzzy),
                Box::new(keyword),
            ],
        }
    }

    /// Cascade tuned for company names (keyword tokens of 2..=4 chars).
    pub fn for_companies() -> Self {
        MatchResolver::cascade(FuzzyMatcher::default(), KeywordMatcher::for_companies())
    }

    /// Cascade tuned for announcement titles (keyword tokens of 2..=6 chars).
    pub fn for_announcements() -> Self {
        MatchResolver::default()
    }

    pub fn builder() -> MatchResolverBuilder {
        MatchResolverBuilder::default()
    }

    /// Arbitrary strategy list, tried in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        MatchResolver { strategies }
    }

    pub fn methods(&self) -> Vec<MatchMethod> {
        self.strategies.iter().map(|s| s.method()).collect()
    }

    pub fn resolve(&self, query_name: &str, candidates: &[Entity]) -> MatchResult {
        let Some(query) = clean_query(query_name) else {
            trace!("Blank query; no match");
            return MatchResult::no_match();
        };
        if candidates.is_empty() {
            trace!("No candidates for '{}'; no match", query);
            return MatchResult::no_match();
        }

        for strategy in &self.strategies {
            let stage_query = if strategy.uses_raw_query() {
                query_name
            } else {
                query
            };
            if let Some(result) = strategy.attempt_match(stage_query, candidates) {
                debug!(
                    "Resolved '{}' via {} to {:?} (confidence {:?})",
                    query,
                    strategy.method(),
                    result.matched_id,
                    result.confidence
                );
                return result;
            }
            trace!("{} stage found nothing for '{}'", strategy.method(), query);
        }

        debug!(
            "No match for '{}' among {} candidates",
            query,
            candidates.len()
        );
        MatchResult::no_match()
    }
}

/// Builds the standard four-stage cascade with custom thresholds.
#[derive(Debug, Clone)]
pub struct MatchResolverBuilder {
    min_ratio: u8,
    keyword_min_len: usize,
    keyword_max_len: usize,
}

impl Default for MatchResolverBuilder {
    fn default() -> Self {
        MatchResolverBuilder {
            min_ratio: MIN_FUZZY_RATIO,
            keyword_min_len: KEYWORD_MIN_LEN,
            keyword_max_len: KEYWORD_MAX_LEN,
        }
    }
}

impl MatchResolverBuilder {
    pub fn min_ratio(mut self, min_ratio: u8) -> Self {
        self.min_ratio = min_ratio;
        self
    }

    pub fn keyword_lengths(mut self, min_len: usize, max_len: usize) -> Self {
        self.keyword_min_len = min_len;
        self.keyword_max_len = max_len;
        self
    }

    pub fn company_keywords(self) -> Self {
        self.keyword_lengths(KEYWORD_MIN_LEN, COMPANY_KEYWORD_MAX_LEN)
    }

    pub fn build(self) -> Result<MatchResolver, MatchError> {
        if self.min_ratio > 100 {
            return Err(MatchError::invalid(format!(
                "fuzzy cutoff {} is outside 0..=100",
                self.min_ratio
            )));
        }
        let keyword = KeywordMatcher::with_lengths(self.keyword_min_len, self.keyword_max_len)?;
        Ok(MatchResolver::cascade(
            FuzzyMatcher::new(self.min_ratio),
            keyword,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a strategy and counts how often the resolver reaches it.
    struct Counting<S> {
        inner: S,
        calls: Arc<AtomicUsize>,
    }

    impl<S: MatchStrategy> MatchStrategy for Counting<S> {
        fn method(&self) -> MatchMethod {
            self.inner.method()
        }

        fn uses_raw_query(&self) -> bool {
            self.inner.uses_raw_query()
        }

        fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.attempt_match(query, candidates)
        }
    }

    fn instrumented() -> (MatchResolver, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let fuzzy_calls = Arc::new(AtomicUsize::new(0));
        let keyword_calls = Arc::new(AtomicUsize::new(0));
        let resolver = MatchResolver::with_strategies(vec![
            Box::new(ExactMatcher),
            Box::new(SubstringMatcher),
            Box::new(Counting {
                inner: FuzzyMatcher::default(),
                calls: fuzzy_calls.clone(),
            }),
            Box::new(Counting {
                inner: KeywordMatcher::default(),
                calls: keyword_calls.clone(),
            }),
        ]);
        (resolver, fuzzy_calls, keyword_calls)
    }

    #[test]
    fn test_exact_wins_over_everything() {
        let candidates = vec![
            Entity::new("1", "대박드림스 - AI 솔루션"),
            Entity::new("2", "대박드림스"),
        ];
        let result = MatchResolver::default().resolve("대박드림스", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "2");
        assert_eq!(result.method, Some(MatchMethod::Exact));
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn test_substring_example() {
        let candidates = vec![
            Entity::new("1", "대박드림스 - AI 솔루션"),
            Entity::new("2", "티벌컨"),
        ];
        let result = MatchResolver::default().resolve("대박드림스", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "1");
        assert_eq!(result.method, Some(MatchMethod::Substring));
    }

    #[test]
    fn test_fuzzy_example() {
        let candidates = vec![Entity::new("7", "Acme Corp")];
        let result = MatchResolver::default().resolve("Acme Corporation", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "7");
        assert_eq!(result.method, Some(MatchMethod::Fuzzy));
        assert_eq!(result.confidence, Some(72));
    }

    #[test]
    fn test_keyword_fallback() {
        let candidates = vec![
            Entity::new("1", "한국 벤처 투자 프로그램 2025년 상반기 모집"),
            Entity::new("2", "창업도약패키지 공고"),
        ];
        let result = MatchResolver::default().resolve("[재공고] 창업도약 지원사업 (마감 연장)", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "2");
        assert_eq!(result.method, Some(MatchMethod::Keyword));
    }

    #[test]
    fn test_unrelated_query_is_no_match() {
        let candidates = vec![Entity::new("1", "Acme Corp"), Entity::new("2", "Beta Ltd")];
        let result = MatchResolver::default().resolve("Zyx!", &candidates);
        assert_eq!(result, MatchResult::no_match());
        assert!(!result.is_match());
    }

    #[test]
    fn test_blank_query_and_empty_candidates() {
        let candidates = vec![Entity::new("1", "Acme")];
        assert!(!MatchResolver::default().resolve("   ", &candidates).is_match());
        assert!(!MatchResolver::default().resolve("Acme", &[]).is_match());
    }

    #[test]
    fn test_exact_compares_untrimmed_query() {
        let candidates = vec![Entity::new("1", "Acme Corp "), Entity::new("2", "Acme Corp")];
        let result = MatchResolver::default().resolve("Acme Corp ", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "1");
        assert_eq!(result.method, Some(MatchMethod::Exact));

        let candidates = vec![Entity::new("1", " 티벌컨")];
        let result = MatchResolver::for_companies().resolve(" 티벌컨", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "1");
        assert_eq!(result.method, Some(MatchMethod::Exact));
    }

    #[test]
    fn test_later_stages_use_trimmed_query() {
        let candidates = vec![Entity::new("1", "Acme")];
        let result = MatchResolver::default().resolve("  Acme ", &candidates);
        assert_eq!(result.matched_id.unwrap().as_str(), "1");
        assert_eq!(result.method, Some(MatchMethod::Substring));
    }

    #[test]
    fn test_fuzzy_not_reached_when_substring_hits() {
        let (resolver, fuzzy_calls, keyword_calls) = instrumented();
        let candidates = vec![
            Entity::new("1", "티벌컨"),
            Entity::new("2", "대박드림스 - AI 솔루션"),
        ];
        let result = resolver.resolve("대박드림스", &candidates);
        assert_eq!(result.method, Some(MatchMethod::Substring));
        assert_eq!(fuzzy_calls.load(Ordering::SeqCst), 0);
        assert_eq!(keyword_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_keyword_not_reached_when_fuzzy_hits() {
        let (resolver, fuzzy_calls, keyword_calls) = instrumented();
        let candidates = vec![Entity::new("1", "Acme Corp")];
        resolver.resolve("Acme Corporation", &candidates);
        assert_eq!(fuzzy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(keyword_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_company_preset_uses_short_keywords() {
        // The 8-char run splits into 4-char tokens only for companies.
        let candidates = vec![Entity::new("1", "주식회사 가나다라 솔루션")];
        let company = MatchResolver::for_companies().resolve("가나다라마바사아", &candidates);
        assert_eq!(company.method, Some(MatchMethod::Keyword));
        let announcement = MatchResolver::for_announcements().resolve("가나다라마바사아", &candidates);
        assert!(!announcement.is_match());
    }

    #[test]
    fn test_builder_validation() {
        assert!(MatchResolver::builder().min_ratio(101).build().is_err());
        assert!(MatchResolver::builder().keyword_lengths(4, 2).build().is_err());
        let resolver = MatchResolver::builder().min_ratio(90).build().unwrap();
        let candidates = vec![Entity::new("7", "Acme Corp")];
        // ratio 72 misses the cutoff; the token "Acme" still hits
        let result = resolver.resolve("Acme Corporation", &candidates);
        assert_eq!(result.method, Some(MatchMethod::Keyword));
        assert_eq!(
            resolver.methods(),
            vec![
                MatchMethod::Exact,
                MatchMethod::Substring,
                MatchMethod::Fuzzy,
                MatchMethod::Keyword
            ]
        );
    }
}
