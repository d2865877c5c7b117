// src/config.rs

use log::info;

// Minimum fuzzy ratio (0-100) for the fuzzy stage to accept its best candidate
pub const MIN_FUZZY_RATIO: u8 = 70;

// Keyword token lengths, in characters
pub const KEYWORD_MIN_LEN: usize = 2;
pub const KEYWORD_MAX_LEN: usize = 6;
// Company names are short; longer tokens rarely hit
pub const COMPANY_KEYWORD_MAX_LEN: usize = 4;

// Number of recommendations kept per company after ranking
pub const MAX_RECOMMENDATIONS: usize = 20;

// Characters of a name shown in warnings about unmatched rows
pub const LOG_NAME_PREVIEW_CHARS: usize = 20;

// Default table layout of the hosted store
pub const COMPANY_TABLE: &str = "companies";
pub const ANNOUNCEMENT_TABLE: &str = "announcements";
pub const RECOMMENDATION_TABLE: &str = "recommendations";
pub const STAGING_TABLE: &str = "recommend_staging";
pub const LEGACY_RECOMMENDATION_TABLE: &str = "recommend2";

// Review status of legacy recommendation rows is keyed by (기업명, 공고제목)
pub const STATUS_COMPANY_COLUMN: &str = "기업명";
pub const STATUS_TITLE_COLUMN: &str = "공고제목";
pub const STATUS_COLUMN: &str = "status";

/// Table and column names used by the sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub company_table: String,
    pub company_id_column: String,
    pub company_name_column: String,
    pub announcement_table: String,
    pub announcement_id_column: String,
    pub announcement_title_column: String,
    pub recommendation_table: String,
    pub staging_table: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            company_table: COMPANY_TABLE.to_string(),
            company_id_column: "id".to_string(),
            company_name_column: "name".to_string(),
            announcement_table: ANNOUNCEMENT_TABLE.to_string(),
            announcement_id_column: "id".to_string(),
            announcement_title_column: "title".to_string(),
            recommendation_table: RECOMMENDATION_TABLE.to_string(),
            staging_table: STAGING_TABLE.to_string(),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `MATCHSYNC_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = SyncConfig::default();
        let var = |key: &str, default: String| std::env::var(key).unwrap_or(default);
        let config = SyncConfig {
            company_table: var("MATCHSYNC_COMPANY_TABLE", defaults.company_table),
            company_id_column: var("MATCHSYNC_COMPANY_ID_COLUMN", defaults.company_id_column),
            company_name_column: var("MATCHSYNC_COMPANY_NAME_COLUMN", defaults.company_name_column),
            announcement_table: var("MATCHSYNC_ANNOUNCEMENT_TABLE", defaults.announcement_table),
            announcement_id_column: var(
                "MATCHSYNC_ANNOUNCEMENT_ID_COLUMN",
                defaults.announcement_id_column,
            ),
            announcement_title_column: var(
                "MATCHSYNC_ANNOUNCEMENT_TITLE_COLUMN",
                defaults.announcement_title_column,
            ),
            recommendation_table: var(
                "MATCHSYNC_RECOMMENDATION_TABLE",
                defaults.recommendation_table,
            ),
            staging_table: var("MATCHSYNC_STAGING_TABLE", defaults.staging_table),
        };
        info!(
            "Sync config: companies={}, announcements={}, recommendations={}, staging={}",
            config.company_table,
            config.announcement_table,
            config.recommendation_table,
            config.staging_table
        );
        config
    }
}
