//! Operation factory.
//!
//! Operation descriptions reference fields and actions by name; the factory
//! resolves them against the state the object has when the operation runs,
//! so a migration can rename a field and update it again further down.

use super::description::{MigrationDescription, OperationDescription};
use super::operations::Operation;
use crate::catalog::{Action, CatalogSyncer, Field, ObjectDescription};
use crate::error::{ErrorCode, MigrationError};
use anyhow::{Context, Result};

/// A migration document resolved into executable operations
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub id: String,
    pub apply_to: String,
    pub depends_on: Vec<String>,
    pub operations: Vec<Operation>,
    /// Object state the operations were resolved against
    pub previous_state: Option<ObjectDescription>,
    pub description: String,
}

pub fn build_migration(
    description: &MigrationDescription,
    catalog: &impl CatalogSyncer,
) -> Result<Migration> {
    let previous_state = if description.apply_to.is_empty() {
        None
    } else {
        Some(catalog.get_required(&description.apply_to)?)
    };

    let operations = build_operations(
        &description.operations,
        previous_state.as_ref(),
        description.is_automatic(),
    )
    .with_context(|| {
        format!(
            "Failed to build migration '{}' for '{}'",
            description.id, description.apply_to
        )
    })?;

    Ok(Migration {
        id: description.id.clone(),
        apply_to: description.apply_to.clone(),
        depends_on: description.depends_on.clone(),
        operations,
        previous_state,
        description: description.description.clone(),
    })
}

/// Resolve each description against the state left by the ones before it
pub fn build_operations(
    descriptions: &[OperationDescription],
    start: Option<&ObjectDescription>,
    automatic: bool,
) -> Result<Vec<Operation>> {
    if descriptions.is_empty() {
        return Err(MigrationError::validation(
            ErrorCode::NoChangesDetected,
            "Migration has no operations",
        )
        .into());
    }

    let mut state = start.cloned();
    let mut operations = Vec::with_capacity(descriptions.len());
    for description in descriptions {
        let operation = build_operation(description, state.as_ref(), automatic)?;
        state = operation.apply(state.as_ref())?;
        operations.push(operation);
    }
    Ok(operations)
}

pub fn build_operation(
    description: &OperationDescription,
    current: Option<&ObjectDescription>,
    automatic: bool,
) -> Result<Operation> {
    Ok(match description {
        OperationDescription::CreateObject { object } => Operation::CreateObject {
            object: object.clone(),
        },
        OperationDescription::RenameObject { object } => Operation::RenameObject {
            new_name: object.name.clone(),
        },
        OperationDescription::DeleteObject { .. } => Operation::DeleteObject,
        OperationDescription::AddField { field } => Operation::AddField {
            field: prepare_field(&field.field, automatic),
        },
        OperationDescription::RemoveField { field } => Operation::RemoveField {
            field: resolve_field(current, field.match_name())?.clone(),
        },
        OperationDescription::UpdateField { field } => Operation::UpdateField {
            current: resolve_field(current, field.match_name())?.clone(),
            new: prepare_field(&field.field, automatic),
        },
        OperationDescription::AddAction { action } => Operation::AddAction {
            action: action.action.clone(),
        },
        OperationDescription::RemoveAction { action } => Operation::RemoveAction {
            action: resolve_action(current, action.match_name())?.clone(),
        },
        OperationDescription::UpdateAction { action } => Operation::UpdateAction {
            current: resolve_action(current, action.match_name())?.clone(),
            new: action.action.clone(),
        },
    })
}

/// Outer links declared by hand take part in both querying and retrieval
fn prepare_field(field: &Field, automatic: bool) -> Field {
    let mut field = field.clone();
    field.normalize();
    if !automatic && field.is_outer_link() {
        field.query_mode = true;
        field.retrieve_mode = true;
    }
    field
}

fn object_label(current: Option<&ObjectDescription>) -> &str {
    current.map_or("<none>", |o| o.name.as_str())
}

fn resolve_field<'a>(current: Option<&'a ObjectDescription>, name: &str) -> Result<&'a Field> {
    current.and_then(|o| o.find_field(name)).ok_or_else(|| {
        MigrationError::validation(
            ErrorCode::PreviousStateFieldNotFound,
            format!(
                "Field '{}' not found in the previous state of object '{}'",
                name,
                object_label(current)
            ),
        )
        .into()
    })
}

fn resolve_action<'a>(current: Option<&'a ObjectDescription>, name: &str) -> Result<&'a Action> {
    current.and_then(|o| o.find_action(name)).ok_or_else(|| {
        MigrationError::validation(
            ErrorCode::PreviousStateActionNotFound,
            format!(
                "Action '{}' not found in the previous state of object '{}'",
                name,
                object_label(current)
            ),
        )
        .into()
    })
}
