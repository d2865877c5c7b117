// src/matching/keyword.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{COMPANY_KEYWORD_MAX_LEN, KEYWORD_MAX_LEN, KEYWORD_MIN_LEN};
use crate::error::MatchError;
use crate::models::{Entity, MatchMethod, MatchResult};
use crate::normalize::fold_case;

use super::MatchStrategy;

static DEFAULT_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| keyword_regex(KEYWORD_MIN_LEN, KEYWORD_MAX_LEN).expect("valid keyword pattern"));

static COMPANY_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    keyword_regex(KEYWORD_MIN_LEN, COMPANY_KEYWORD_MAX_LEN).expect("valid keyword pattern")
});

fn keyword_regex(min_len: usize, max_len: usize) -> Result<Regex, MatchError> {
    if min_len == 0 || min_len > max_len {
        return Err(MatchError::invalid(format!(
            "keyword length range {}..={} is empty",
            min_len, max_len
        )));
    }
    Regex::new(&format!(r"\w{{{},{}}}", min_len, max_len))
        .map_err(|e| MatchError::invalid(format!("keyword pattern rejected: {}", e)))
}

/// Last-resort stage: retries containment search with short tokens of the query.
///
/// Tokens are greedy, non-overlapping runs of word characters (any script) of
/// `min_len..=max_len` characters. A longer run is cut into consecutive chunks;
/// a trailing remainder shorter than `min_len` is dropped.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        KeywordMatcher {
            pattern: DEFAULT_KEYWORD_RE.clone(),
        }
    }
}

impl KeywordMatcher {
    pub fn with_lengths(min_len: usize, max_len: usize) -> Result<Self, MatchError> {
        Ok(KeywordMatcher {
            pattern: keyword_regex(min_len, max_len)?,
        })
    }

    /// Shorter tokens, as used when reconciling company names.
    pub fn for_companies() -> Self {
        KeywordMatcher {
            pattern: COMPANY_KEYWORD_RE.clone(),
        }
    }

    pub fn extract_keywords<'q>(&self, query: &'q str) -> Vec<&'q str> {
        self.pattern.find_iter(query).map(|m| m.as_str()).collect()
    }
}

impl MatchStrategy for KeywordMatcher {
    fn method(&self) -> MatchMethod {
        MatchMethod::Keyword
    }

    fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult> {
        let keywords = self.extract_keywords(query);
        if keywords.is_empty() {
            return None;
        }
        let folded: Vec<String> = candidates.iter().map(|c| fold_case(&c.name)).collect();
        for keyword in keywords {
            let keyword = fold_case(keyword);
            if let Some(idx) = folded.iter().position(|name| name.contains(&keyword)) {
                return Some(MatchResult::matched(
                    candidates[idx].id.clone(),
                    MatchMethod::Keyword,
                ));
            }
        }
        None
    }
}
