// src/status.rs

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{STATUS_COLUMN, STATUS_COMPANY_COLUMN, STATUS_TITLE_COLUMN};
use crate::error::MatchError;
use crate::models::Row;
use crate::store::RowStore;

/// Review state of one recommended announcement for one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationStatus {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(MatchError::invalid(format!(
                "unknown recommendation status '{}'",
                other
            ))),
        }
    }
}

fn is_recommendation(row: &Row, company_name: &str, announcement_title: &str) -> bool {
    matches!(row.get(STATUS_COMPANY_COLUMN), Some(Value::String(c)) if c == company_name)
        && matches!(row.get(STATUS_TITLE_COLUMN), Some(Value::String(t)) if t == announcement_title)
}

/// Current status of a `(기업명, 공고제목)` recommendation.
///
/// A missing row, a missing `status` column or a null status all read as `Pending`.
pub async fn get_recommendation_status(
    store: &dyn RowStore,
    table: &str,
    company_name: &str,
    announcement_title: &str,
) -> Result<RecommendationStatus> {
    let rows = store
        .fetch_rows_ilike(table, STATUS_COMPANY_COLUMN, company_name)
        .await
        .with_context(|| format!("Failed to look up status for '{}' in {}", company_name, table))?;

    let Some(row) = rows
        .iter()
        .find(|row| is_recommendation(row, company_name, announcement_title))
    else {
        debug!(
            "No recommendation '{}' / '{}' in {}; status is pending",
            company_name, announcement_title, table
        );
        return Ok(RecommendationStatus::Pending);
    };

    match row.get(STATUS_COLUMN) {
        None | Some(Value::Null) => Ok(RecommendationStatus::Pending),
        Some(Value::String(s)) => Ok(s.parse()?),
        Some(other) => Err(MatchError::invalid(format!(
            "status column holds a non-text value: {}",
            other
        ))
        .into()),
    }
}

/// Sets the status on every row keyed by `(기업명, 공고제목)`; returns the rows touched.
pub async fn update_recommendation_status(
    store: &dyn RowStore,
    table: &str,
    company_name: &str,
    announcement_title: &str,
    status: RecommendationStatus,
) -> Result<u64> {
    let mut values = Row::new();
    values.insert(
        STATUS_COLUMN.to_string(),
        Value::String(status.as_str().to_string()),
    );
    let touched = store
        .update_rows(
            table,
            &[
                (STATUS_COMPANY_COLUMN, Value::String(company_name.to_string())),
                (STATUS_TITLE_COLUMN, Value::String(announcement_title.to_string())),
            ],
            values,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to set status {} for '{}' / '{}'",
                status, company_name, announcement_title
            )
        })?;

    if touched == 0 {
        warn!(
            "No recommendation '{}' / '{}' in {} to mark {}",
            company_name, announcement_title, table, status
        );
    } else {
        info!(
            "Marked {} recommendation row(s) for '{}' as {}",
            touched, company_name, status
        );
    }
    Ok(touched)
}
