//! Migration history records.

use super::description::{MigrationDescription, OperationDescription};
use crate::catalog::ObjectDescription;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One applied migration, as persisted by the database backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    /// Object the migration left behind (the removed object for deletions)
    pub apply_to: String,
    pub depends_on: Vec<String>,
    pub operations: Vec<OperationDescription>,
    /// Object description before the migration, `None` for creations
    pub previous_state: Option<ObjectDescription>,
    /// Object description after the migration, `None` for deletions
    pub meta_state: Option<ObjectDescription>,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
    /// Application order, assigned by the backend
    #[serde(default)]
    pub order: i64,
}

impl HistoryRecord {
    pub fn new(
        description: &MigrationDescription,
        apply_to: &str,
        previous_state: Option<ObjectDescription>,
        meta_state: Option<ObjectDescription>,
    ) -> Result<Self> {
        Ok(Self {
            id: description.id.clone(),
            apply_to: apply_to.to_string(),
            depends_on: description.depends_on.clone(),
            operations: description.operations.clone(),
            previous_state,
            meta_state,
            checksum: calculate_checksum(&description.operations)?,
            applied_at: Utc::now(),
            order: 0,
        })
    }

    /// The migration document this record was produced from
    pub fn to_description(&self) -> MigrationDescription {
        MigrationDescription {
            id: self.id.clone(),
            apply_to: self.apply_to.clone(),
            depends_on: self.depends_on.clone(),
            operations: self.operations.clone(),
            description: String::new(),
        }
    }

    pub fn parent(&self) -> Option<&str> {
        self.depends_on.first().map(String::as_str)
    }
}

/// md5 of the serialized operation list
pub fn calculate_checksum(operations: &[OperationDescription]) -> Result<String> {
    let content = serde_json::to_string(operations)?;
    Ok(format!("{:x}", md5::compute(content)))
}
