//! Migration operations and their two-phase contract.
//!
//! Every operation first rewrites the catalog ([`Operation::sync_meta_description`])
//! and then executes the DDL the change implies ([`Operation::sync_db_description`]).
//! Both phases run inside the same global transaction.

pub mod action;
pub mod field;
pub mod object;

use crate::catalog::{Action, CatalogSyncer, CatalogTransaction, Field, ObjectDescription};
use crate::db::DbTransaction;
use crate::diff::operations::{DdlStep, SqlRenderer};
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateObject { object: ObjectDescription },
    RenameObject { new_name: String },
    DeleteObject,
    AddField { field: Field },
    /// Field as currently stored
    RemoveField { field: Field },
    UpdateField { current: Field, new: Field },
    AddAction { action: Action },
    RemoveAction { action: Action },
    UpdateAction { current: Action, new: Action },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateObject { .. } => "createObject",
            Operation::RenameObject { .. } => "renameObject",
            Operation::DeleteObject => "deleteObject",
            Operation::AddField { .. } => "addField",
            Operation::RemoveField { .. } => "removeField",
            Operation::UpdateField { .. } => "updateField",
            Operation::AddAction { .. } => "addAction",
            Operation::RemoveAction { .. } => "removeAction",
            Operation::UpdateAction { .. } => "updateAction",
        }
    }

    /// Object state after this operation. Never touches `current`.
    pub fn apply(&self, current: Option<&ObjectDescription>) -> Result<Option<ObjectDescription>> {
        if let Operation::CreateObject { object } = self {
            return object::create(current, object).map(Some);
        }

        let current = current.ok_or_else(|| {
            MigrationError::validation(
                ErrorCode::ObjectNotFound,
                format!("Cannot {} on an object that does not exist", self.kind()),
            )
        })?;

        let updated = match self {
            Operation::DeleteObject => return Ok(None),
            Operation::CreateObject { object } => object::create(Some(current), object)?,
            Operation::RenameObject { new_name } => object::rename(current, new_name)?,
            Operation::AddField { field } => field::add(current, field)?,
            Operation::RemoveField { field } => field::remove(current, &field.name)?,
            Operation::UpdateField { current: old, new } => field::update(current, &old.name, new)?,
            Operation::AddAction { action } => action::add(current, action)?,
            Operation::RemoveAction { action } => action::remove(current, &action.name)?,
            Operation::UpdateAction { current: old, new } => {
                action::update(current, &old.name, new)?
            }
        };
        Ok(Some(updated))
    }

    /// Catalog phase: compute the new description and persist it
    pub fn sync_meta_description(
        &self,
        current: Option<&ObjectDescription>,
        transaction: &mut CatalogTransaction,
        catalog: &impl CatalogSyncer,
    ) -> Result<Option<ObjectDescription>> {
        let updated = self.apply(current)?;

        match (current, updated.as_ref()) {
            (None, Some(created)) => transaction.create(catalog, created)?,
            (Some(old), None) => {
                transaction.remove(catalog, &old.name)?;
            }
            (Some(old), Some(new)) if old != new => {
                if old.name != new.name && catalog.get(&new.name)?.is_some() {
                    return Err(MigrationError::consistency(
                        ErrorCode::Duplicated,
                        format!(
                            "Cannot rename '{}' to '{}': an object with that name exists",
                            old.name, new.name
                        ),
                    )
                    .into());
                }
                transaction.update(catalog, &old.name, new)?;
            }
            _ => {}
        }

        debug!(
            "Catalog updated by {} on {}",
            self.kind(),
            updated.as_ref().or(current).map_or("<none>", |o| o.name.as_str())
        );
        Ok(updated)
    }

    /// Physical steps taking `current` to `updated`
    pub fn ddl_steps(
        &self,
        current: Option<&ObjectDescription>,
        updated: Option<&ObjectDescription>,
        catalog: &impl CatalogSyncer,
    ) -> Result<Vec<DdlStep>> {
        match self {
            Operation::CreateObject { .. }
            | Operation::RenameObject { .. }
            | Operation::DeleteObject => object::ddl_steps(current, updated, catalog),
            Operation::AddField { field } => {
                field::ddl_steps(current, Some(&field.name), updated, Some(&field.name), catalog)
            }
            Operation::RemoveField { field } => {
                field::ddl_steps(current, Some(&field.name), updated, None, catalog)
            }
            Operation::UpdateField { current: old, new } => {
                field::ddl_steps(current, Some(&old.name), updated, Some(&new.name), catalog)
            }
            Operation::AddAction { .. }
            | Operation::RemoveAction { .. }
            | Operation::UpdateAction { .. } => Ok(Vec::new()),
        }
    }

    /// Database phase: execute the DDL implied by the catalog change
    pub async fn sync_db_description<T: DbTransaction>(
        &self,
        current: Option<&ObjectDescription>,
        updated: Option<&ObjectDescription>,
        transaction: &mut T,
        catalog: &impl CatalogSyncer,
    ) -> Result<()> {
        let steps = self.ddl_steps(current, updated, catalog)?;

        for step in &steps {
            for statement in step.to_sql() {
                if statement.is_destructive() {
                    warn!("Executing destructive statement: {}", statement.sql);
                } else {
                    debug!("Executing: {}", statement.sql);
                }
                transaction.execute(&statement).await.map_err(|e| {
                    MigrationError::ddl(step.object_name(), &statement.sql, format!("{:#}", e))
                })?;
            }
        }
        Ok(())
    }
}
