// src/matching/mod.rs
pub mod exact;
pub mod fuzzy;
pub mod keyword;
pub mod resolver;
pub mod substring;

use crate::models::{Entity, MatchMethod, MatchResult};

pub use exact::ExactMatcher;
pub use fuzzy::{FuzzyMatcher, fuzzy_ratio};
pub use keyword::KeywordMatcher;
pub use resolver::{MatchResolver, MatchResolverBuilder};
pub use substring::SubstringMatcher;

/// One stage of the resolver cascade.
///
/// `attempt_match` receives a non-blank query and a non-empty candidate set.
/// The query is trimmed unless `uses_raw_query` is true, in which case it is
/// passed exactly as given. Returning `None` hands the query to the next stage.
pub trait MatchStrategy: Send + Sync {
    fn method(&self) -> MatchMethod;

    fn uses_raw_query(&self) -> bool {
        false
    }

    fn attempt_match(&self, query: &str, candidates: &[Entity]) -> Option<MatchResult>;
}
