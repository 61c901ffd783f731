//! Migrations: wire documents, executable operations and the manager that
//! applies and rolls them back.

pub mod cascade;
pub mod constructor;
pub mod description;
pub mod factory;
pub mod history;
pub mod manager;
pub mod operations;
pub mod reversion;

pub use description::{
    MigrationAction, MigrationDescription, MigrationField, MigrationObjectDescription,
    OperationDescription,
};
pub use history::HistoryRecord;
pub use manager::MigrationManager;
pub use operations::Operation;

use crate::constants::MIGRATION_ID_LENGTH;

/// Short random id for migrations submitted without one
pub fn generate_migration_id() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(MIGRATION_ID_LENGTH)
        .collect()
}
