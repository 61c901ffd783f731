//! Inverse operations for rollback.

use super::description::OperationDescription;
use super::factory::build_operations;
use super::operations::Operation;
use crate::catalog::ObjectDescription;
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;

/// Inverse of `operation`, given the object state it was applied to.
/// `None` when the operation left the object untouched.
pub fn invert(operation: &Operation, before: Option<&ObjectDescription>) -> Result<Option<Operation>> {
    if let Some(before) = before
        && operation.apply(Some(before))?.as_ref() == Some(before)
    {
        return Ok(None);
    }

    let inverse = match operation {
        Operation::CreateObject { .. } => Operation::DeleteObject,
        Operation::DeleteObject => Operation::CreateObject {
            object: before.cloned().ok_or_else(|| {
                MigrationError::validation(
                    ErrorCode::ObjectNotFound,
                    "Cannot invert deleteObject without the deleted description",
                )
            })?,
        },
        Operation::RenameObject { .. } => Operation::RenameObject {
            new_name: before.map(|o| o.name.clone()).ok_or_else(|| {
                MigrationError::validation(
                    ErrorCode::ObjectNotFound,
                    "Cannot invert renameObject without the previous name",
                )
            })?,
        },
        Operation::AddField { field } => Operation::RemoveField {
            field: field.clone(),
        },
        Operation::RemoveField { field } => Operation::AddField {
            field: field.clone(),
        },
        Operation::UpdateField { current, new } => Operation::UpdateField {
            current: new.clone(),
            new: current.clone(),
        },
        Operation::AddAction { action } => Operation::RemoveAction {
            action: action.clone(),
        },
        Operation::RemoveAction { action } => Operation::AddAction {
            action: action.clone(),
        },
        Operation::UpdateAction { current, new } => Operation::UpdateAction {
            current: new.clone(),
            new: current.clone(),
        },
    };
    Ok(Some(inverse))
}

/// Operations undoing `operations`, in the order they must run
pub fn inverse_operations(
    previous_state: Option<&ObjectDescription>,
    operations: &[OperationDescription],
) -> Result<Vec<Operation>> {
    let forward = build_operations(operations, previous_state, false)?;

    let mut state = previous_state.cloned();
    let mut inverses = Vec::with_capacity(forward.len());
    for operation in &forward {
        inverses.extend(invert(operation, state.as_ref())?);
        state = operation.apply(state.as_ref())?;
    }
    inverses.reverse();
    Ok(inverses)
}
