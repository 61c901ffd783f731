//! PostgreSQL backend: DDL runs in a sqlx transaction and history lives in a
//! table of the same database, so both commit together.

use super::connection::connect_to_database;
use super::error_context::SqlErrorContext;
use super::{Database, DbTransaction};
use crate::config::HistoryTable;
use crate::error::MigrationError;
use crate::migration::history::HistoryRecord;
use crate::render::{RenderedSql, is_valid_identifier};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};
use tracing::debug;

/// Safely format a schema-qualified history table name.
///
/// Identifiers may hold letters, digits, underscores and dollar signs and
/// must not start with a digit.
pub fn format_history_table_name(table: &HistoryTable) -> Result<String> {
    for (kind, name) in [("schema", &table.schema), ("table", &table.name)] {
        if !is_valid_identifier(name) {
            return Err(anyhow!(
                "Invalid {} name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
                kind,
                name
            ));
        }
    }

    Ok(format!(r#""{}"."{}""#, table.schema, table.name))
}

#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
    table: String,
}

impl PgDatabase {
    /// Connect and make sure the history table exists
    pub async fn connect(url: &str, history_table: &HistoryTable) -> Result<Self> {
        let pool = connect_to_database(url, "metamig database").await?;
        Self::new(pool, history_table).await
    }

    pub async fn new(pool: PgPool, history_table: &HistoryTable) -> Result<Self> {
        let table = format_history_table_name(history_table)?;
        let database = Self { pool, table };
        database.ensure_history_table().await?;
        Ok(database)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_history_table(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                "order" BIGSERIAL PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                apply_to TEXT NOT NULL,
                depends_on TEXT NOT NULL,
                operations TEXT NOT NULL,
                previous_state TEXT,
                meta_state TEXT,
                checksum TEXT NOT NULL,
                applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to create history table {}", self.table))?;

        Ok(())
    }

    fn select(&self, filter: &str) -> String {
        format!(
            r#"SELECT "order", id, apply_to, depends_on, operations, previous_state, meta_state, checksum, applied_at FROM {} {}"#,
            self.table, filter
        )
    }
}

fn record_from_row(row: &PgRow) -> Result<HistoryRecord> {
    let json_column = |name: &str| -> Result<Option<String>> {
        row.try_get::<Option<String>, _>(name)
            .with_context(|| format!("Failed to read history column {}", name))
    };
    let parse_state = |name: &str| -> Result<_> {
        json_column(name)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .with_context(|| format!("Corrupted {} in history table", name))
    };

    let id: String = row.try_get("id")?;
    let depends_on = json_column("depends_on")?.unwrap_or_else(|| "[]".to_string());
    let operations = json_column("operations")?.unwrap_or_else(|| "[]".to_string());

    Ok(HistoryRecord {
        depends_on: serde_json::from_str(&depends_on)
            .with_context(|| format!("Corrupted dependsOn for migration {}", id))?,
        operations: serde_json::from_str(&operations)
            .with_context(|| format!("Corrupted operations for migration {}", id))?,
        previous_state: parse_state("previous_state")?,
        meta_state: parse_state("meta_state")?,
        apply_to: row.try_get("apply_to")?,
        checksum: row.try_get("checksum")?,
        applied_at: row.try_get::<DateTime<Utc>, _>("applied_at")?,
        order: row.try_get("order")?,
        id,
    })
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin database transaction")?;
        Ok(PgTransaction {
            tx: Some(tx),
            table: self.table.clone(),
            finished: "committed",
        })
    }

    async fn latest_history(&self, apply_to: &str) -> Result<Option<HistoryRecord>> {
        let row = sqlx::query(&self.select(r#"WHERE apply_to = $1 ORDER BY "order" DESC LIMIT 1"#))
            .bind(apply_to)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read latest migration of {}", apply_to))?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_history(&self, id: &str) -> Result<Option<HistoryRecord>> {
        let row = sqlx::query(&self.select("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to look up migration {}", id))?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn list_history(&self, apply_to: Option<&str>) -> Result<Vec<HistoryRecord>> {
        let rows = match apply_to {
            Some(name) => {
                sqlx::query(&self.select(r#"WHERE apply_to = $1 ORDER BY "order""#))
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query(&self.select(r#"ORDER BY "order""#))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Failed to list migration history")?;

        rows.iter().map(record_from_row).collect()
    }
}

pub struct PgTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
    table: String,
    /// State reported once `tx` has been consumed
    finished: &'static str,
}

impl PgTransaction {
    fn pending(&mut self, action: &str) -> Result<&mut sqlx::Transaction<'static, Postgres>> {
        let finished = self.finished;
        self.tx
            .as_mut()
            .ok_or_else(|| MigrationError::transaction(action, finished).into())
    }
}

#[async_trait]
impl DbTransaction for PgTransaction {
    async fn execute(&mut self, statement: &RenderedSql) -> Result<()> {
        let tx = self.pending("execute in")?;
        let conn: &mut sqlx::PgConnection = &mut **tx;
        sqlx::Executor::execute(conn, sqlx::raw_sql(&statement.sql))
            .await
            .map_err(|e| anyhow!(SqlErrorContext::from_sqlx_error(&e).format()))?;
        Ok(())
    }

    async fn record_history(&mut self, record: &HistoryRecord) -> Result<()> {
        let depends_on = serde_json::to_string(&record.depends_on)?;
        let operations = serde_json::to_string(&record.operations)?;
        let previous_state = record
            .previous_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let meta_state = record
            .meta_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let sql = format!(
            "INSERT INTO {} (id, apply_to, depends_on, operations, previous_state, meta_state, checksum, applied_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            self.table
        );

        let tx = self.pending("write to")?;
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.apply_to)
            .bind(depends_on)
            .bind(operations)
            .bind(previous_state)
            .bind(meta_state)
            .bind(&record.checksum)
            .bind(record.applied_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| anyhow!(SqlErrorContext::from_sqlx_error(&e).format()))
            .with_context(|| format!("Failed to record migration {}", record.id))?;
        Ok(())
    }

    async fn remove_history(&mut self, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let tx = self.pending("write to")?;
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to remove migration {}", id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<()> {
        self.pending("commit")?;
        if let Some(tx) = self.tx.take() {
            self.finished = "committed";
            tx.commit().await.context("Failed to commit database transaction")?;
            debug!("Database transaction committed");
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending("roll back")?;
        if let Some(tx) = self.tx.take() {
            self.finished = "rolled back";
            tx.rollback()
                .await
                .context("Failed to roll back database transaction")?;
            debug!("Database transaction rolled back");
        }
        Ok(())
    }
}
