//! In-process database used by tests and dry runs.
//!
//! Statements are not interpreted; they are recorded in execution order so
//! callers can assert on the exact DDL a migration produced. Work done in a
//! transaction becomes visible only on commit.

use super::{Database, DbTransaction};
use crate::catalog::TransactionState;
use crate::error::MigrationError;
use crate::migration::history::HistoryRecord;
use crate::render::RenderedSql;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    executed: Vec<String>,
    history: Vec<HistoryRecord>,
    next_order: i64,
    fail_on: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every statement containing `fragment` fail
    pub fn fail_on(&self, fragment: &str) {
        lock(&self.state).fail_on = Some(fragment.to_string());
    }

    pub fn clear_failure(&self) {
        lock(&self.state).fail_on = None;
    }

    /// Committed statements, oldest first
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state).executed.clone()
    }

    pub fn clear_executed(&self) {
        lock(&self.state).executed.clear();
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            statements: Vec::new(),
            recorded: Vec::new(),
            removed: Vec::new(),
            status: TransactionState::Pending,
        })
    }

    async fn latest_history(&self, apply_to: &str) -> Result<Option<HistoryRecord>> {
        Ok(lock(&self.state)
            .history
            .iter()
            .filter(|r| r.apply_to == apply_to)
            .max_by_key(|r| r.order)
            .cloned())
    }

    async fn find_history(&self, id: &str) -> Result<Option<HistoryRecord>> {
        Ok(lock(&self.state)
            .history
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_history(&self, apply_to: Option<&str>) -> Result<Vec<HistoryRecord>> {
        let mut records: Vec<HistoryRecord> = lock(&self.state)
            .history
            .iter()
            .filter(|r| apply_to.is_none_or(|name| r.apply_to == name))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.order);
        Ok(records)
    }
}

#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    statements: Vec<String>,
    recorded: Vec<HistoryRecord>,
    removed: Vec<String>,
    status: TransactionState,
}

impl MemoryTransaction {
    fn ensure_pending(&self, action: &str) -> Result<()> {
        if self.status != TransactionState::Pending {
            return Err(MigrationError::transaction(action, self.status.to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DbTransaction for MemoryTransaction {
    async fn execute(&mut self, statement: &RenderedSql) -> Result<()> {
        self.ensure_pending("execute in")?;
        let fail_on = lock(&self.state).fail_on.clone();
        if let Some(fragment) = fail_on
            && statement.sql.contains(fragment.as_str())
        {
            return Err(anyhow!("simulated failure on statement containing '{}'", fragment));
        }
        self.statements.push(statement.sql.clone());
        Ok(())
    }

    async fn record_history(&mut self, record: &HistoryRecord) -> Result<()> {
        self.ensure_pending("write to")?;
        let duplicate = lock(&self.state).history.iter().any(|r| r.id == record.id)
            || self.recorded.iter().any(|r| r.id == record.id);
        if duplicate {
            return Err(anyhow!("duplicate key value violates unique constraint on id '{}'", record.id));
        }
        self.recorded.push(record.clone());
        Ok(())
    }

    async fn remove_history(&mut self, id: &str) -> Result<bool> {
        self.ensure_pending("write to")?;
        if let Some(pos) = self.recorded.iter().position(|r| r.id == id) {
            self.recorded.remove(pos);
            return Ok(true);
        }
        let exists = lock(&self.state).history.iter().any(|r| r.id == id);
        if exists && !self.removed.iter().any(|r| r == id) {
            self.removed.push(id.to_string());
            return Ok(true);
        }
        Ok(false)
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_pending("commit")?;
        let mut state = lock(&self.state);
        state.executed.append(&mut self.statements);
        state.history.retain(|r| !self.removed.contains(&r.id));
        for mut record in self.recorded.drain(..) {
            state.next_order += 1;
            record.order = state.next_order;
            state.history.push(record);
        }
        self.status = TransactionState::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_pending("roll back")?;
        self.statements.clear();
        self.recorded.clear();
        self.removed.clear();
        self.status = TransactionState::RolledBack;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::description::MigrationDescription;

    fn record(id: &str, apply_to: &str) -> Result<HistoryRecord> {
        let mut description = MigrationDescription::new(apply_to, vec![]);
        description.id = id.to_string();
        HistoryRecord::new(&description, apply_to, None, None)
    }

    #[tokio::test]
    async fn test_commit_publishes_statements_and_history() -> Result<()> {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await?;
        tx.execute(&RenderedSql::new("CREATE TABLE \"o_a\" ();".to_string()))
            .await?;
        tx.record_history(&record("m1", "a")?).await?;

        assert!(db.executed().is_empty());
        assert!(db.latest_history("a").await?.is_none());

        tx.commit().await?;
        assert_eq!(db.executed().len(), 1);
        assert_eq!(db.latest_history("a").await?.map(|r| r.order), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_discards_everything() -> Result<()> {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await?;
        tx.execute(&RenderedSql::new("SELECT 1;".to_string())).await?;
        tx.record_history(&record("m1", "a")?).await?;
        tx.rollback().await?;

        assert!(db.executed().is_empty());
        assert!(db.list_history(None).await?.is_empty());
        assert!(tx.commit().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_injection() -> Result<()> {
        let db = MemoryDatabase::new();
        db.fail_on("DROP");
        let mut tx = db.begin().await?;
        assert!(tx.execute(&RenderedSql::new("DROP TABLE x;".to_string())).await.is_err());
        tx.execute(&RenderedSql::new("SELECT 1;".to_string())).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_history_ordering_and_removal() -> Result<()> {
        let db = MemoryDatabase::new();
        for id in ["m1", "m2", "m3"] {
            let mut tx = db.begin().await?;
            tx.record_history(&record(id, if id == "m2" { "b" } else { "a" })?)
                .await?;
            tx.commit().await?;
        }

        let ids: Vec<String> = db.list_history(Some("a")).await?.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        assert_eq!(db.latest_history("a").await?.map(|r| r.id), Some("m3".to_string()));

        let mut tx = db.begin().await?;
        assert!(tx.remove_history("m3").await?);
        assert!(!tx.remove_history("m3").await?);
        assert!(tx.record_history(&record("m1", "a")?).await.is_err());
        tx.commit().await?;

        assert_eq!(db.latest_history("a").await?.map(|r| r.id), Some("m1".to_string()));
        Ok(())
    }
}
