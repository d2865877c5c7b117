// src/ranking.rs

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use serde_json::Value;

use crate::config::MAX_RECOMMENDATIONS;
use crate::models::{EntityId, Recommendation, Row};
use crate::store::RowStore;

/// Which record survives when several share a `(company_id, announcement_title)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// The earliest record in input order, whatever its score.
    #[default]
    FirstSeen,
    /// The best-scoring record; earliest among equal scores.
    HighestScore,
}

/// Drops repeats by `(company_id, announcement_title)`, keeping the first-seen
/// record, then orders by score descending. Equal scores keep input order and
/// a missing score counts as 0.
pub fn dedupe_and_rank(records: Vec<Recommendation>) -> Vec<Recommendation> {
    dedupe_and_rank_with(records, DedupPolicy::FirstSeen)
}

pub fn dedupe_and_rank_with(
    records: Vec<Recommendation>,
    policy: DedupPolicy,
) -> Vec<Recommendation> {
    let input_len = records.len();
    let mut slot_by_key: HashMap<(EntityId, String), usize> = HashMap::with_capacity(input_len);
    let mut unique: Vec<Recommendation> = Vec::with_capacity(input_len);

    for record in records {
        let key = record.dedup_key();
        match slot_by_key.get(&key) {
            None => {
                slot_by_key.insert(key, unique.len());
                unique.push(record);
            }
            Some(&slot) => {
                if policy == DedupPolicy::HighestScore
                    && record.rank_score() > unique[slot].rank_score()
                {
                    unique[slot] = record;
                }
            }
        }
    }

    // Vec::sort_by is stable
    unique.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));

    debug!(
        "Deduplicated {} recommendations to {} ({:?})",
        input_len,
        unique.len(),
        policy
    );
    unique
}

/// `dedupe_and_rank` truncated to `limit` records.
pub fn top_recommendations(records: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    let mut ranked = dedupe_and_rank(records);
    ranked.truncate(limit);
    ranked
}

/// `top_recommendations` with the default per-company limit.
pub fn default_top_recommendations(records: Vec<Recommendation>) -> Vec<Recommendation> {
    top_recommendations(records, MAX_RECOMMENDATIONS)
}

/// Recommendations whose `company_column` contains `company_name` (ILIKE lookup).
pub async fn load_company_recommendations(
    store: &dyn RowStore,
    table: &str,
    company_column: &str,
    company_name: &str,
) -> Result<Vec<Recommendation>> {
    let rows = store
        .fetch_rows_ilike(table, company_column, company_name)
        .await
        .with_context(|| format!("Failed to load recommendations for '{}' from {}", company_name, table))?;
    let records = rows
        .iter()
        .map(Recommendation::from_row)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Malformed recommendation row in {}", table))?;
    info!(
        "Loaded {} recommendations for '{}' from {}",
        records.len(),
        company_name,
        table
    );
    Ok(records)
}

/// Ranks `records` for one company, keeps the top `MAX_RECOMMENDATIONS` and
/// inserts them into `table` under `company_id`. Returns the rows inserted.
pub async fn save_recommendations(
    store: &dyn RowStore,
    table: &str,
    company_id: &EntityId,
    records: Vec<Recommendation>,
) -> Result<u64> {
    let candidates = records.len();
    let now = Utc::now().to_rfc3339();
    let rows: Vec<Row> = default_top_recommendations(records)
        .into_iter()
        .map(|mut rec| {
            rec.company_id = company_id.clone();
            let mut row = rec.to_row();
            row.insert("created_at".to_string(), Value::String(now.clone()));
            row.insert("updated_at".to_string(), Value::String(now.clone()));
            row
        })
        .collect();
    if rows.is_empty() {
        debug!("No recommendations to save for company {}", company_id);
        return Ok(0);
    }

    let inserted = store
        .insert_rows(table, rows)
        .await
        .with_context(|| format!("Failed to save recommendations for company {} to {}", company_id, table))?;
    info!(
        "Saved {} of {} recommendations for company {} to {}",
        inserted, candidates, company_id, table
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(company: &str, title: &str, score: Option<f64>) -> Recommendation {
        Recommendation {
            company_id: EntityId(company.to_string()),
            company_name: String::new(),
            announcement_title: title.to_string(),
            announcement_source: None,
            score,
            reason: None,
            application_start_date: None,
            application_end_date: None,
            detail_page_url: None,
        }
    }

    fn summary(records: &[Recommendation]) -> Vec<(String, String, Option<f64>)> {
        records
            .iter()
            .map(|r| {
                (
                    r.company_id.0.clone(),
                    r.announcement_title.clone(),
                    r.score,
                )
            })
            .collect()
    }

    #[test]
    fn test_first_seen_wins_even_with_lower_score() {
        let ranked = dedupe_and_rank(vec![rec("1", "A", Some(50.0)), rec("1", "A", Some(90.0))]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, Some(50.0));
    }

    #[test]
    fn test_highest_score_policy() {
        let ranked = dedupe_and_rank_with(
            vec![
                rec("1", "A", Some(50.0)),
                rec("1", "A", Some(90.0)),
                rec("1", "A", Some(90.0)),
            ],
            DedupPolicy::HighestScore,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, Some(90.0));
    }

    #[test]
    fn test_key_includes_company() {
        let ranked = dedupe_and_rank(vec![rec("1", "A", Some(10.0)), rec("2", "A", Some(20.0))]);
        assert_eq!(
            summary(&ranked),
            vec![
                ("2".to_string(), "A".to_string(), Some(20.0)),
                ("1".to_string(), "A".to_string(), Some(10.0)),
            ]
        );
    }

    #[test]
    fn test_sort_is_stable_and_missing_score_is_zero() {
        let ranked = dedupe_and_rank(vec![
            rec("1", "none", None),
            rec("1", "low", Some(0.0)),
            rec("1", "mid-a", Some(70.0)),
            rec("1", "top", Some(150.0)),
            rec("1", "mid-b", Some(70.0)),
        ]);
        let titles: Vec<&str> = ranked
            .iter()
            .map(|r| r.announcement_title.as_str())
            .collect();
        assert_eq!(titles, vec!["top", "mid-a", "mid-b", "none", "low"]);
        assert_eq!(ranked[3].score, None);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe_and_rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            rec("1", "A", Some(10.0)),
            rec("2", "B", None),
            rec("1", "A", Some(99.0)),
            rec("1", "C", Some(10.0)),
            rec("2", "B", Some(5.0)),
        ];
        let once = dedupe_and_rank(input);
        let twice = dedupe_and_rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_highest_score_keeps_max_per_key_and_scores_untouched() {
        let input = vec![
            rec("1", "A", Some(10.0)),
            rec("1", "A", Some(99.0)),
            rec("2", "B", Some(5.0)),
            rec("2", "B", Some(1.0)),
        ];
        let ranked = dedupe_and_rank_with(input, DedupPolicy::HighestScore);
        assert_eq!(
            summary(&ranked),
            vec![
                ("1".to_string(), "A".to_string(), Some(99.0)),
                ("2".to_string(), "B".to_string(), Some(5.0)),
            ]
        );
    }

    #[test]
    fn test_top_recommendations_truncates_after_ranking() {
        let input: Vec<Recommendation> = (0..30)
            .map(|i| rec("1", &format!("T{}", i), Some(i as f64)))
            .collect();
        let top = default_top_recommendations(input);
        assert_eq!(top.len(), MAX_RECOMMENDATIONS);
        assert_eq!(top[0].score, Some(29.0));
        assert_eq!(top[19].score, Some(10.0));
    }
}
