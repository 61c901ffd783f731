//! Migration constructor: diffs the stored description of an object against
//! the desired one and produces the migration document taking one to the
//! other.
//!
//! Object-level changes win: creation, deletion and renaming each produce a
//! single-operation migration. A rename submitted together with field or
//! action changes only renames; the remaining changes come out of the next
//! construction against the renamed object.

use super::description::{
    MigrationAction, MigrationDescription, MigrationField, MigrationObjectDescription,
    OperationDescription,
};
use super::generate_migration_id;
use crate::catalog::ObjectDescription;
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;
use std::collections::BTreeSet;

fn no_changes() -> anyhow::Error {
    MigrationError::validation(ErrorCode::NoChangesDetected, "No changes were detected").into()
}

pub fn construct(
    current: Option<&ObjectDescription>,
    desired: Option<&MigrationObjectDescription>,
    latest_migration: Option<&str>,
) -> Result<MigrationDescription> {
    let (apply_to, operations) = match (current, desired) {
        (None, None) => return Err(no_changes()),

        (None, Some(desired)) => (
            String::new(),
            vec![OperationDescription::CreateObject {
                object: desired.to_object(),
            }],
        ),

        (Some(current), None) => (
            current.name.clone(),
            vec![OperationDescription::DeleteObject {
                object: current.clone(),
            }],
        ),

        (Some(current), Some(desired)) if current.name != desired.name => (
            current.name.clone(),
            vec![OperationDescription::RenameObject {
                object: desired.to_object(),
            }],
        ),

        (Some(current), Some(desired)) => {
            let mut operations = diff_fields(current, desired);
            operations.extend(diff_actions(current, desired));
            if operations.is_empty() {
                return Err(no_changes());
            }
            (current.name.clone(), operations)
        }
    };

    let depends_on = if apply_to.is_empty() {
        Vec::new()
    } else {
        latest_migration.map(str::to_string).into_iter().collect()
    };

    Ok(MigrationDescription {
        id: generate_migration_id(),
        apply_to,
        depends_on,
        operations,
        description: String::new(),
    })
}

/// Removals, then updates, then additions, so renames never collide with
/// names freed or claimed in the same migration
fn diff_fields(
    current: &ObjectDescription,
    desired: &MigrationObjectDescription,
) -> Vec<OperationDescription> {
    let mut matched = BTreeSet::new();
    let mut updates = Vec::new();
    let mut additions = Vec::new();

    for wanted in &desired.fields {
        let mut field = wanted.field.clone();
        field.normalize();

        match current.find_field(wanted.match_name()) {
            Some(existing) => {
                matched.insert(existing.name.as_str());
                if existing.differs_from(&field) {
                    let migration_field = if existing.name == field.name {
                        MigrationField::new(field)
                    } else {
                        MigrationField::renamed(field, &existing.name)
                    };
                    updates.push(OperationDescription::UpdateField {
                        field: migration_field,
                    });
                }
            }
            None => additions.push(OperationDescription::AddField {
                field: MigrationField::new(field),
            }),
        }
    }

    let mut operations: Vec<OperationDescription> = current
        .fields
        .iter()
        .filter(|f| !matched.contains(f.name.as_str()))
        .map(|f| OperationDescription::RemoveField {
            field: MigrationField::new(f.clone()),
        })
        .collect();
    operations.extend(updates);
    operations.extend(additions);
    operations
}

fn diff_actions(
    current: &ObjectDescription,
    desired: &MigrationObjectDescription,
) -> Vec<OperationDescription> {
    let mut matched = BTreeSet::new();
    let mut updates = Vec::new();
    let mut additions = Vec::new();

    for wanted in &desired.actions {
        match current.find_action(wanted.match_name()) {
            Some(existing) => {
                matched.insert(existing.name.as_str());
                if existing.differs_from(&wanted.action) {
                    updates.push(OperationDescription::UpdateAction {
                        action: MigrationAction::renamed(wanted.action.clone(), &existing.name),
                    });
                }
            }
            None => additions.push(OperationDescription::AddAction {
                action: MigrationAction::new(wanted.action.clone()),
            }),
        }
    }

    let mut operations: Vec<OperationDescription> = current
        .actions
        .iter()
        .filter(|a| !matched.contains(a.name.as_str()))
        .map(|a| OperationDescription::RemoveAction {
            action: MigrationAction::new(a.clone()),
        })
        .collect();
    operations.extend(updates);
    operations.extend(additions);
    operations
}
