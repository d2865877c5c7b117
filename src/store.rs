// src/store.rs

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::normalize::contains_ignore_case;

pub use crate::models::Row;

/// Generic table access used by the sync glue.
///
/// Implementations report failures as-is; nothing here retries.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows of `table`, in storage order.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>>;

    /// Rows whose `column` contains `needle`, case-insensitively.
    async fn fetch_rows_ilike(&self, table: &str, column: &str, needle: &str) -> Result<Vec<Row>>;

    /// Sets `values` on every row matching all `filters`; returns the number of rows touched.
    async fn update_rows(&self, table: &str, filters: &[(&str, Value)], values: Row)
    -> Result<u64>;

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<u64>;
}

/// Comparable text form of a scalar, so `7` and `"7"` filter alike.
pub(crate) fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn row_matches(row: &Row, filters: &[(&str, Value)]) -> bool {
    filters.iter().all(|(column, expected)| {
        match (row.get(*column).and_then(scalar_key), scalar_key(expected)) {
            (Some(actual), Some(expected)) => actual == expected,
            _ => false,
        }
    })
}

/// In-process table store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.get_mut().insert(table.to_string(), rows);
        self
    }

    pub async fn create_table(&self, table: &str, rows: Vec<Row>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Snapshot of a table's rows.
    pub async fn rows(&self, table: &str) -> Result<Vec<Row>> {
        self.fetch_rows(table).await
    }
}

fn missing_table(table: &str) -> anyhow::Error {
    anyhow!("relation \"{}\" does not exist", table)
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        tables.get(table).cloned().ok_or_else(|| missing_table(table))
    }

    async fn fetch_rows_ilike(&self, table: &str, column: &str, needle: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        let needle = needle.trim();
        Ok(rows
            .iter()
            .filter(|row| {
                matches!(row.get(column), Some(Value::String(s)) if contains_ignore_case(s, needle))
            })
            .cloned()
            .collect())
    }

    async fn update_rows(
        &self,
        table: &str,
        filters: &[(&str, Value)],
        values: Row,
    ) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let mut touched = 0u64;
        for row in rows.iter_mut().filter(|row| row_matches(row, filters)) {
            for (column, value) in &values {
                row.insert(column.clone(), value.clone());
            }
            touched += 1;
        }
        debug!("Memory store: updated {} rows in {}", touched, table);
        Ok(touched)
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let existing = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let count = rows.len() as u64;
        existing.extend(rows);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_update_matches_numeric_and_text_ids() {
        let store = MemoryStore::new();
        store
            .create_table(
                "recommendations",
                vec![
                    row(json!({"company_id": 1, "announcement_id": "10", "reason": "old"})),
                    row(json!({"company_id": 2, "announcement_id": "10", "reason": "old"})),
                ],
            )
            .await;

        let touched = store
            .update_rows(
                "recommendations",
                &[("company_id", json!("1")), ("announcement_id", json!(10))],
                row(json!({"reason": "new"})),
            )
            .await
            .unwrap();
        assert_eq!(touched, 1);

        let rows = store.rows("recommendations").await.unwrap();
        assert_eq!(rows[0]["reason"], json!("new"));
        assert_eq!(rows[1]["reason"], json!("old"));
    }

    #[tokio::test]
    async fn test_update_by_entity_id_keeps_leading_zeros() {
        let store = MemoryStore::new().with_table(
            "companies",
            vec![
                row(json!({"id": "007", "name": "제로세븐"})),
                row(json!({"id": 7, "name": "세븐"})),
            ],
        );
        let id = crate::models::EntityId("007".to_string());
        let touched = store
            .update_rows("companies", &[("id", id.to_value())], row(json!({"name": "007 주식회사"})))
            .await
            .unwrap();
        assert_eq!(touched, 1);
        let rows = store.rows("companies").await.unwrap();
        assert_eq!(rows[0]["name"], json!("007 주식회사"));
        assert_eq!(rows[1]["name"], json!("세븐"));
    }

    #[tokio::test]
    async fn test_ilike_and_missing_table() {
        let store = MemoryStore::new();
        store
            .create_table(
                "recommend2",
                vec![
                    row(json!({"기업명": "대박드림스 - AI", "공고제목": "A"})),
                    row(json!({"기업명": "티벌컨", "공고제목": "B"})),
                    row(json!({"기업명": null, "공고제목": "C"})),
                ],
            )
            .await;
        let hits = store
            .fetch_rows_ilike("recommend2", "기업명", "대박드림스")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["공고제목"], json!("A"));

        assert!(store.fetch_rows("nope").await.is_err());
        assert!(store.insert_rows("nope", vec![]).await.is_err());
    }
}
