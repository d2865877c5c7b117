// src/db.rs

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::{debug, info, warn};
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Config, NoTls};

use crate::models::Row;
use crate::normalize::like_contains_pattern;
use crate::store::{RowStore, scalar_key};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found. Variables already set in the process win.
pub fn load_env() -> Option<&'static str> {
    for path in ENV_PATHS {
        if !Path::new(path).exists() {
            continue;
        }
        match dotenv::from_path(path) {
            Ok(()) => {
                info!("Loaded environment variables from {}", path);
                return Some(path);
            }
            Err(e) => warn!("Failed to load environment from {}: {}", path, e),
        }
    }
    info!("No .env file found, using environment variables from system");
    None
}

/// Reads `POSTGRES_*` environment variables and constructs a PostgreSQL config.
fn build_pg_config() -> Config {
    let mut config = Config::new();
    let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port_str = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let port = port_str.parse::<u16>().unwrap_or(5432);
    let dbname = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "postgres".to_string());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();

    info!(
        "DB Config: Host={}, Port={}, DB={}, User={}",
        host, port, dbname, user
    );
    config
        .host(&host)
        .port(port)
        .dbname(&dbname)
        .user(&user)
        .password(&password);
    config.application_name("matchsync");
    config.connect_timeout(Duration::from_secs(10));
    config
}

/// Initializes the database connection pool and checks it with `SELECT 1`.
pub async fn connect() -> Result<PgPool> {
    let config = build_pg_config();
    info!("Connecting to PostgreSQL database...");
    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .idle_timeout(Some(Duration::from_secs(180)))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    {
        let conn = pool
            .get()
            .await
            .context("Failed to get test connection from pool")?;
        conn.query_one("SELECT 1", &[])
            .await
            .context("Test query 'SELECT 1' failed")?;
    }
    info!("Database connection pool initialized successfully.");
    Ok(pool)
}

/// Double-quotes an identifier; `schema.table` is quoted per part.
pub fn quote_ident(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

fn column_list(columns: &[&String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn into_row(value: Value) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("row_to_json returned a non-object: {}", other)),
    }
}

/// `RowStore` over a Postgres pool. Rows travel as JSON in both directions.
#[derive(Clone)]
pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    pub fn new(pool: PgPool) -> Self {
        PgRowStore { pool }
    }

    async fn query_rows(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        what: &str,
    ) -> Result<Vec<Row>> {
        let conn = self
            .pool
            .get()
            .await
            .with_context(|| format!("Failed to get DB connection for {}", what))?;
        let rows = conn
            .query(sql, params)
            .await
            .with_context(|| format!("Failed to query {}", what))?;
        rows.into_iter()
            .map(|row| into_row(row.get::<_, Value>(0)))
            .collect()
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>> {
        let sql = format!("SELECT row_to_json(t)::jsonb FROM {} t", quote_ident(table));
        let rows = self.query_rows(&sql, &[], table).await?;
        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn fetch_rows_ilike(&self, table: &str, column: &str, needle: &str) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT row_to_json(t)::jsonb FROM {} t WHERE t.{}::text ILIKE $1 ESCAPE '\\'",
            quote_ident(table),
            quote_ident(column)
        );
        let pattern = like_contains_pattern(needle);
        self.query_rows(&sql, &[&pattern], table).await
    }

    async fn update_rows(
        &self,
        table: &str,
        filters: &[(&str, Value)],
        values: Row,
    ) -> Result<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        let table_ident = quote_ident(table);
        let columns: Vec<&String> = values.keys().collect();
        let column_sql = column_list(&columns);

        let filter_values: Vec<String> = filters
            .iter()
            .map(|(column, value)| {
                scalar_key(value).ok_or_else(|| {
                    anyhow!("filter on {}.{} is not a scalar: {}", table, column, value)
                })
            })
            .collect::<Result<_>>()?;
        let mut sql = format!(
            "UPDATE {table} AS t SET ({cols}) = (SELECT {cols} FROM json_populate_record(NULL::{table}, $1::json))",
            table = table_ident,
            cols = column_sql
        );
        for (idx, (column, _)) in filters.iter().enumerate() {
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("t.{}::text = ${}", quote_ident(column), idx + 2));
        }

        let payload = Value::Object(values);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(filters.len() + 1);
        params.push(&payload);
        for value in &filter_values {
            params.push(value);
        }

        let conn = self
            .pool
            .get()
            .await
            .with_context(|| format!("Failed to get DB connection for update of {}", table))?;
        let touched = conn
            .execute(sql.as_str(), &params)
            .await
            .with_context(|| format!("Failed to update {}", table))?;
        debug!("Updated {} rows in {}", touched, table);
        Ok(touched)
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut columns: Vec<&String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(&key) {
                    columns.push(key);
                }
            }
        }
        let table_ident = quote_ident(table);
        let column_sql = column_list(&columns);
        let sql = format!(
            "INSERT INTO {table} ({cols}) SELECT {cols} FROM json_populate_recordset(NULL::{table}, $1::json)",
            table = table_ident,
            cols = column_sql
        );
        let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());

        let conn = self
            .pool
            .get()
            .await
            .with_context(|| format!("Failed to get DB connection for insert into {}", table))?;
        let inserted = conn
            .execute(sql.as_str(), &[&payload])
            .await
            .with_context(|| format!("Failed to insert {} rows into {}", rows.len(), table))?;
        info!("Inserted {} rows into {}", inserted, table);
        Ok(inserted)
    }
}
