//! Physical store: DDL execution and migration history.
//!
//! The manager is generic over [`Database`] so the same code drives
//! PostgreSQL in production and [`memory::MemoryDatabase`] in tests.

pub mod connection;
pub mod error_context;
pub mod memory;
pub mod postgres;

pub use connection::{connect_to_database, mask_url_password};
pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;

use crate::migration::history::HistoryRecord;
use crate::render::RenderedSql;
use anyhow::Result;
use async_trait::async_trait;

/// Database side of the global transaction
#[async_trait]
pub trait DbTransaction: Send {
    async fn execute(&mut self, statement: &RenderedSql) -> Result<()>;

    /// Append a history record; visible to queries once committed
    async fn record_history(&mut self, record: &HistoryRecord) -> Result<()>;

    /// Returns false when no record had this id
    async fn remove_history(&mut self, id: &str) -> Result<bool>;

    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Database: Send + Sync {
    type Transaction: DbTransaction;

    async fn begin(&self) -> Result<Self::Transaction>;

    /// Most recently applied migration for an object
    async fn latest_history(&self, apply_to: &str) -> Result<Option<HistoryRecord>>;

    async fn find_history(&self, id: &str) -> Result<Option<HistoryRecord>>;

    /// Records in application order, optionally for one object
    async fn list_history(&self, apply_to: Option<&str>) -> Result<Vec<HistoryRecord>>;
}
