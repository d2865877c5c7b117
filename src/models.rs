// src/models.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MatchError;

/// A generic row as returned by the store: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

//------------------------------------------------------------------------------
// IDENTIFIER TYPES
//------------------------------------------------------------------------------

/// Opaque identifier of a company or announcement, stable within one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of a JSON value. Integer ids become their decimal text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(EntityId(s.clone())),
            Value::Number(n) => Some(EntityId(n.to_string())),
            _ => None,
        }
    }

    /// JSON form used when filtering store rows by this id. Stores compare ids
    /// by text, so the id text is passed through unchanged ("007" stays "007").
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

//------------------------------------------------------------------------------
// ENTITIES
//------------------------------------------------------------------------------

/// A named thing to be matched: a company or an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Entity {
            id: EntityId(id.into()),
            name: name.into(),
        }
    }

    /// Builds an entity from a store row. The name must be a JSON string.
    pub fn from_row(row: &Row, id_column: &str, name_column: &str) -> Result<Self, MatchError> {
        let id = row
            .get(id_column)
            .and_then(EntityId::from_value)
            .ok_or_else(|| {
                MatchError::invalid(format!("row has no usable '{}' column", id_column))
            })?;
        match row.get(name_column) {
            Some(Value::String(name)) => Ok(Entity {
                id,
                name: name.clone(),
            }),
            Some(other) => Err(MatchError::invalid(format!(
                "column '{}' of row {} is not a string: {}",
                name_column, id, other
            ))),
            None => Err(MatchError::invalid(format!(
                "row {} has no '{}' column",
                id, name_column
            ))),
        }
    }
}

/// Converts a batch of rows into a candidate set, preserving row order.
///
/// With `skip_null_names`, rows whose name is JSON `null` are left out instead of
/// failing the whole batch. Any other malformed row is still an error.
pub fn entities_from_rows(
    rows: &[Row],
    id_column: &str,
    name_column: &str,
    skip_null_names: bool,
) -> Result<Vec<Entity>, MatchError> {
    let mut entities = Vec::with_capacity(rows.len());
    for row in rows {
        if skip_null_names && matches!(row.get(name_column), Some(Value::Null)) {
            continue;
        }
        entities.push(Entity::from_row(row, id_column, name_column)?);
    }
    Ok(entities)
}

//------------------------------------------------------------------------------
// MATCH RESULTS
//------------------------------------------------------------------------------

/// The stage of the resolver cascade that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Substring,
    Fuzzy,
    Keyword,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one query name against one candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    /// `None` means no candidate matched.
    pub matched_id: Option<EntityId>,
    pub method: Option<MatchMethod>,
    /// Only the fuzzy stage reports a confidence (0-100).
    pub confidence: Option<u8>,
}

impl MatchResult {
    pub fn no_match() -> Self {
        MatchResult::default()
    }

    pub fn matched(id: EntityId, method: MatchMethod) -> Self {
        MatchResult {
            matched_id: Some(id),
            method: Some(method),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn is_match(&self) -> bool {
        self.matched_id.is_some()
    }
}

//------------------------------------------------------------------------------
// RECOMMENDATIONS
//------------------------------------------------------------------------------

/// A (company, announcement) pairing scored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub company_id: EntityId,
    pub company_name: String,
    pub announcement_title: String,
    pub announcement_source: Option<String>,
    /// Missing scores rank as 0.
    pub score: Option<f64>,
    pub reason: Option<String>,
    pub application_start_date: Option<String>,
    pub application_end_date: Option<String>,
    pub detail_page_url: Option<String>,
}

// Column aliases. The legacy recommend2 table uses Korean headers.
const COMPANY_ID_COLUMNS: [&str; 1] = ["company_id"];
const COMPANY_NAME_COLUMNS: [&str; 2] = ["company_name", "기업명"];
const TITLE_COLUMNS: [&str; 3] = ["announcement_title", "공고제목", "공고명"];
const SOURCE_COLUMNS: [&str; 2] = ["announcement_source", "공고출처"];
const SCORE_COLUMNS: [&str; 3] = ["total_score", "score", "총점수"];
const REASON_COLUMNS: [&str; 4] = ["matching_reason", "reason", "매칭이유", "추천이유"];
const START_DATE_COLUMNS: [&str; 2] = ["application_start_date", "접수시작일"];
const END_DATE_COLUMNS: [&str; 2] = ["application_end_date", "접수마감일"];
const URL_COLUMNS: [&str; 2] = ["detail_page_url", "공고보기"];

/// First non-null value among the given column aliases.
pub(crate) fn first_present<'a>(row: &'a Row, columns: &[&str]) -> Option<&'a Value> {
    columns
        .iter()
        .filter_map(|c| row.get(*c))
        .find(|v| !v.is_null())
}

/// Optional text column. Numbers are rendered, other non-string values rejected.
pub(crate) fn optional_text(row: &Row, columns: &[&str]) -> Result<Option<String>, MatchError> {
    match first_present(row, columns) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(MatchError::invalid(format!(
            "column '{}' holds a non-text value: {}",
            columns[0], other
        ))),
    }
}

fn optional_score(row: &Row) -> Result<Option<f64>, MatchError> {
    match first_present(row, &SCORE_COLUMNS) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(score) if score.is_finite() => Ok(Some(score)),
            Ok(_) => Err(MatchError::invalid(format!("score '{}' is not finite", s))),
            Err(_) => Err(MatchError::invalid(format!("score '{}' is not numeric", s))),
        },
        Some(other) => Err(MatchError::invalid(format!(
            "score holds a non-numeric value: {}",
            other
        ))),
    }
}

impl Recommendation {
    /// Reads a recommendation from either the current or the legacy column layout.
    ///
    /// Legacy rows carry no `company_id`; the company name stands in as identity.
    pub fn from_row(row: &Row) -> Result<Self, MatchError> {
        let company_name = optional_text(row, &COMPANY_NAME_COLUMNS)?.unwrap_or_default();
        let company_id = match first_present(row, &COMPANY_ID_COLUMNS) {
            Some(v) => EntityId::from_value(v)
                .ok_or_else(|| MatchError::invalid(format!("company_id is not an id: {}", v)))?,
            None if !company_name.is_empty() => EntityId(company_name.clone()),
            None => {
                return Err(MatchError::invalid(
                    "recommendation row has neither company_id nor company name",
                ));
            }
        };
        let announcement_title = optional_text(row, &TITLE_COLUMNS)?.ok_or_else(|| {
            MatchError::invalid(format!(
                "recommendation for company {} has no announcement title",
                company_id
            ))
        })?;

        Ok(Recommendation {
            company_id,
            company_name,
            announcement_title,
            announcement_source: optional_text(row, &SOURCE_COLUMNS)?,
            score: optional_score(row)?,
            reason: optional_text(row, &REASON_COLUMNS)?,
            application_start_date: optional_text(row, &START_DATE_COLUMNS)?,
            application_end_date: optional_text(row, &END_DATE_COLUMNS)?,
            detail_page_url: optional_text(row, &URL_COLUMNS)?,
        })
    }

    /// Score used for ordering.
    pub fn rank_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Identity used for deduplication.
    pub fn dedup_key(&self) -> (EntityId, String) {
        (self.company_id.clone(), self.announcement_title.clone())
    }

    /// Row in the current column layout. Absent optional fields are left out.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("company_id".to_string(), self.company_id.to_value());
        row.insert(
            "company_name".to_string(),
            Value::String(self.company_name.clone()),
        );
        row.insert(
            "announcement_title".to_string(),
            Value::String(self.announcement_title.clone()),
        );
        if let Some(score) = self.score {
            row.insert("total_score".to_string(), Value::from(score));
        }
        let optional = [
            ("announcement_source", &self.announcement_source),
            ("matching_reason", &self.reason),
            ("application_start_date", &self.application_start_date),
            ("application_end_date", &self.application_end_date),
            ("detail_page_url", &self.detail_page_url),
        ];
        for (column, value) in optional {
            if let Some(v) = value {
                row.insert(column.to_string(), Value::String(v.clone()));
            }
        }
        row
    }
}
