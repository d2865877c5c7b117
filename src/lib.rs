// src/lib.rs
pub mod config;
pub mod db;
pub mod error;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod schedule;
pub mod status;
pub mod store;
pub mod sync;

// Re-export common types for easier access
pub use error::MatchError;
pub use models::{Entity, EntityId, MatchMethod, MatchResult, Recommendation, Row};

// Re-export important functionality
pub use db::{PgPool, PgRowStore};
pub use matching::{MatchResolver, MatchStrategy};
pub use ranking::{DedupPolicy, dedupe_and_rank, save_recommendations};
pub use status::RecommendationStatus;
pub use store::{MemoryStore, RowStore};
