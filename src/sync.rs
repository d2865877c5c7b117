// src/sync.rs

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{LOG_NAME_PREVIEW_CHARS, SyncConfig};
use crate::error::MatchError;
use crate::matching::MatchResolver;
use crate::models::{Entity, EntityId, MatchMethod, Row, entities_from_rows, optional_text};
use crate::store::RowStore;

// Staged row columns; CSV exports use the Korean headers
const COMPANY_NAME_COLUMNS: [&str; 2] = ["기업명", "company_name"];
const TITLE_COLUMNS: [&str; 3] = ["공고이름", "announcement_title", "공고제목"];
const REASON_COLUMNS: [&str; 2] = ["추천이유", "reason"];
const AMOUNT_COLUMNS: [&str; 2] = ["투자금액", "investment_amount"];
const DUE_DATE_COLUMNS: [&str; 2] = ["마감일", "due_date"];
const STATUS_COLUMNS: [&str; 2] = ["공고상태", "announcement_status"];

/// One staged recommendation row to push into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecord {
    pub company_name: String,
    pub announcement_title: String,
    pub reason: Option<String>,
    pub investment_amount: Option<String>,
    pub due_date: Option<String>,
    pub announcement_status: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SyncRecord {
    pub fn from_row(row: &Row) -> Result<Self, MatchError> {
        let company_name = trimmed(optional_text(row, &COMPANY_NAME_COLUMNS)?)
            .ok_or_else(|| MatchError::invalid("staged row has no company name"))?;
        let announcement_title = trimmed(optional_text(row, &TITLE_COLUMNS)?).ok_or_else(|| {
            MatchError::invalid(format!(
                "staged row for '{}' has no announcement title",
                company_name
            ))
        })?;
        Ok(SyncRecord {
            company_name,
            announcement_title,
            reason: trimmed(optional_text(row, &REASON_COLUMNS)?),
            investment_amount: trimmed(optional_text(row, &AMOUNT_COLUMNS)?),
            due_date: trimmed(optional_text(row, &DUE_DATE_COLUMNS)?),
            announcement_status: trimmed(optional_text(row, &STATUS_COLUMNS)?),
        })
    }

    /// Announcement columns to overwrite, if the record carries any.
    fn announcement_update(&self) -> Option<Row> {
        let mut update = Row::new();
        if let Some(amount) = &self.investment_amount {
            update.insert("amount_text".to_string(), Value::String(amount.clone()));
        }
        if let Some(due) = &self.due_date {
            update.insert("due_date".to_string(), Value::String(due.clone()));
        }
        if let Some(status) = &self.announcement_status {
            update.insert("update_type".to_string(), Value::String(status.clone()));
        }
        if update.is_empty() { None } else { Some(update) }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone)]
pub struct SyncStats {
    pub run_id: String,
    pub total: usize,
    pub updated: usize,
    pub unmatched: usize,
    /// Matched records whose updates touched no row, or that carried nothing to write.
    pub untouched: usize,
    /// Rows touched in the recommendation table.
    pub recommendation_rows_updated: u64,
    /// Rows touched in the announcement table.
    pub announcement_rows_updated: u64,
    pub company_methods: HashMap<MatchMethod, usize>,
    pub announcement_methods: HashMap<MatchMethod, usize>,
    pub elapsed: Duration,
}

impl SyncStats {
    fn new(total: usize) -> Self {
        SyncStats {
            run_id: Uuid::new_v4().to_string(),
            total,
            updated: 0,
            unmatched: 0,
            untouched: 0,
            recommendation_rows_updated: 0,
            announcement_rows_updated: 0,
            company_methods: HashMap::new(),
            announcement_methods: HashMap::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Percentage of records that resolved and were pushed.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.updated as f64 / self.total as f64 * 100.0
        }
    }
}

fn preview(name: &str) -> String {
    name.chars().take(LOG_NAME_PREVIEW_CHARS).collect()
}

async fn load_candidates(
    store: &dyn RowStore,
    table: &str,
    id_column: &str,
    name_column: &str,
) -> Result<Vec<Entity>> {
    let rows = store
        .fetch_rows(table)
        .await
        .with_context(|| format!("Failed to fetch candidate rows from {}", table))?;
    let entities = entities_from_rows(&rows, id_column, name_column, true)
        .with_context(|| format!("Malformed candidate row in {}", table))?;
    debug!("Loaded {} candidates from {}", entities.len(), table);
    Ok(entities)
}

/// Reads and validates the staged rows.
pub async fn load_staged_records(store: &dyn RowStore, config: &SyncConfig) -> Result<Vec<SyncRecord>> {
    let rows = store
        .fetch_rows(&config.staging_table)
        .await
        .with_context(|| format!("Failed to fetch staged rows from {}", config.staging_table))?;
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            SyncRecord::from_row(row)
                .with_context(|| format!("Staged row {} of {} is malformed", idx, config.staging_table))
        })
        .collect()
}

/// Resolves each record to a company and an announcement and pushes its
/// reason and announcement details. Unresolved records are counted and skipped;
/// store failures end the run.
pub async fn sync_records(
    store: &dyn RowStore,
    records: &[SyncRecord],
    config: &SyncConfig,
) -> Result<SyncStats> {
    let start_time = Instant::now();
    let mut stats = SyncStats::new(records.len());
    info!(
        "Starting sync of {} staged recommendations (run ID: {})",
        records.len(),
        stats.run_id
    );

    let companies = load_candidates(
        store,
        &config.company_table,
        &config.company_id_column,
        &config.company_name_column,
    )
    .await?;
    let announcements = load_candidates(
        store,
        &config.announcement_table,
        &config.announcement_id_column,
        &config.announcement_title_column,
    )
    .await?;
    info!(
        "Matching against {} companies and {} announcements",
        companies.len(),
        announcements.len()
    );

    let company_resolver = MatchResolver::for_companies();
    let announcement_resolver = MatchResolver::for_announcements();

    for record in records {
        let company = company_resolver.resolve(&record.company_name, &companies);
        let announcement =
            announcement_resolver.resolve(&record.announcement_title, &announcements);

        let (Some(company_id), Some(announcement_id)) = (&company.matched_id, &announcement.matched_id)
        else {
            stats.unmatched += 1;
            warn!(
                "Match failed: {}... - {}...",
                preview(&record.company_name),
                preview(&record.announcement_title)
            );
            continue;
        };

        if let Some(method) = company.method {
            *stats.company_methods.entry(method).or_insert(0) += 1;
        }
        if let Some(method) = announcement.method {
            *stats.announcement_methods.entry(method).or_insert(0) += 1;
        }

        let touched =
            push_record(store, config, record, company_id, announcement_id, &mut stats).await?;
        if touched == 0 {
            stats.untouched += 1;
            debug!(
                "No rows changed for company {} / announcement {} ({}...)",
                company_id,
                announcement_id,
                preview(&record.company_name)
            );
        }
        stats.updated += 1;
    }

    stats.elapsed = start_time.elapsed();
    info!(
        "Sync complete in {:.2?}: {} updated ({} without effect), {} unmatched, success rate {:.1}%",
        stats.elapsed,
        stats.updated,
        stats.untouched,
        stats.unmatched,
        stats.success_rate()
    );
    Ok(stats)
}

async fn push_record(
    store: &dyn RowStore,
    config: &SyncConfig,
    record: &SyncRecord,
    company_id: &EntityId,
    announcement_id: &EntityId,
    stats: &mut SyncStats,
) -> Result<u64> {
    let mut touched = 0;
    if let Some(reason) = &record.reason {
        let mut values = Row::new();
        values.insert("reason".to_string(), Value::String(reason.clone()));
        let rows = store
            .update_rows(
                &config.recommendation_table,
                &[
                    ("company_id", company_id.to_value()),
                    ("announcement_id", announcement_id.to_value()),
                ],
                values,
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to update recommendation for company {} / announcement {}",
                    company_id, announcement_id
                )
            })?;
        stats.recommendation_rows_updated += rows;
        touched += rows;
    }

    if let Some(update) = record.announcement_update() {
        let rows = store
            .update_rows(
                &config.announcement_table,
                &[(config.announcement_id_column.as_str(), announcement_id.to_value())],
                update,
            )
            .await
            .with_context(|| format!("Failed to update announcement {}", announcement_id))?;
        stats.announcement_rows_updated += rows;
        touched += rows;
    }
    Ok(touched)
}
