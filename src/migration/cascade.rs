//! Companion migrations that keep reverse links in step.
//!
//! Inner links (`object`, `generic`) are mirrored by an outer field on every
//! target. When an operation changes an inner link, the migrations built here
//! add, update or remove those outer fields. An `objects` field is stored in
//! a `<owner>__<target>` link object which is created and deleted along with
//! the field. Companion migrations carry no id and run inside
//! the same global transaction as the operation that spawned them:
//! [`run_before`] ones ahead of it, [`run_after`] ones once it has been
//! applied. Both read the catalog at the moment they are called.

use super::description::{MigrationDescription, MigrationField, OperationDescription};
use super::operations::Operation;
use crate::catalog::{
    CatalogSyncer, DefaultValue, Field, FieldType, LinkType, ObjectDescription, link_object_name,
    reverse_link_name,
};
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;
use std::collections::BTreeSet;

/// Objects an inner link points at
pub fn link_targets(field: &Field) -> BTreeSet<String> {
    if field.is_inner_object_link() {
        field.link_meta.iter().cloned().collect()
    } else if field.is_inner_generic_link() {
        field.link_meta_list.iter().cloned().collect()
    } else {
        BTreeSet::new()
    }
}

/// The outer field maintained on each target of `owner.field`
pub fn reverse_field(owner: &str, field: &Field) -> Field {
    let field_type = if field.is_inner_generic_link() {
        FieldType::Generic
    } else {
        FieldType::Array
    };
    let mut reverse = Field::new(&reverse_link_name(owner), field_type).optional();
    reverse.link_type = Some(LinkType::Outer);
    reverse.link_meta = Some(owner.to_string());
    reverse.outer_link_field = Some(field.name.clone());
    reverse.query_mode = true;
    reverse
}

/// Link object backing an `objects` field of `owner`
pub fn link_object_for(owner: &str, field: &Field) -> Option<String> {
    if !field.is_objects_link() {
        return None;
    }
    field
        .link_meta
        .as_deref()
        .map(|target| link_object_name(owner, target))
}

/// A generated key plus a required inner link to each side
pub fn link_object(owner: &str, target: &str) -> ObjectDescription {
    ObjectDescription::new(
        &link_object_name(owner, target),
        "id",
        vec![
            Field::new("id", FieldType::Number)
                .with_default(DefaultValue::expr("nextval"))
                .optional(),
            Field::new(owner, FieldType::Object).link_to(owner),
            Field::new(target, FieldType::Object).link_to(target),
        ],
    )
}

fn spawn(apply_to: &str, operation: OperationDescription) -> MigrationDescription {
    MigrationDescription::new(apply_to, vec![operation])
}

fn add_reverse(target: &str, owner: &str, field: &Field) -> MigrationDescription {
    spawn(
        target,
        OperationDescription::AddField {
            field: MigrationField::new(reverse_field(owner, field)),
        },
    )
}

fn remove_reverse(target: &str, reverse: &Field) -> MigrationDescription {
    spawn(
        target,
        OperationDescription::RemoveField {
            field: MigrationField::new(reverse.clone()),
        },
    )
}

fn update_reverse(target: &str, reverse: &Field, desired: Field) -> MigrationDescription {
    spawn(
        target,
        OperationDescription::UpdateField {
            field: MigrationField::renamed(desired, &reverse.name),
        },
    )
}

/// Reverse fields to add for each target not mirroring `owner.field` yet
fn add_reverse_links(
    owner: &str,
    field: &Field,
    targets: &BTreeSet<String>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let mut spawned = Vec::new();
    for target in targets {
        let object = catalog.get_required(target)?;
        if object.reverse_outer_field(owner, &field.name).is_none() {
            spawned.push(add_reverse(target, owner, field));
        }
    }
    Ok(spawned)
}

/// Reverse fields mirroring `owner.<field_name>` on the given targets
fn remove_reverse_links(
    owner: &str,
    field_name: &str,
    targets: &BTreeSet<String>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let mut spawned = Vec::new();
    for target in targets {
        let Some(object) = catalog.get(target)? else {
            continue;
        };
        if let Some(reverse) = object.reverse_outer_field(owner, field_name) {
            spawned.push(remove_reverse(target, reverse));
        }
    }
    Ok(spawned)
}

fn create_link_object(
    owner: &str,
    field: &Field,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let Some(target) = field.link_meta.as_deref().filter(|_| field.is_objects_link()) else {
        return Ok(Vec::new());
    };
    if target == owner {
        return Err(MigrationError::validation(
            ErrorCode::NotImplemented,
            format!(
                "Field '{}' of object '{}' links the object to itself through an objects field",
                field.name, owner
            ),
        )
        .into());
    }

    let object = link_object(owner, target);
    if catalog.get(&object.name)?.is_some() {
        return Ok(Vec::new());
    }
    Ok(vec![spawn("", OperationDescription::CreateObject { object })])
}

fn delete_link_object(
    owner: &str,
    field: &Field,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let Some(name) = link_object_for(owner, field) else {
        return Ok(Vec::new());
    };
    Ok(catalog
        .get(&name)?
        .map(|object| spawn(&name, OperationDescription::DeleteObject { object }))
        .into_iter()
        .collect())
}

fn required<'a>(object: Option<&'a ObjectDescription>, operation: &Operation) -> Result<&'a ObjectDescription> {
    object.ok_or_else(|| {
        MigrationError::validation(
            ErrorCode::ObjectNotFound,
            format!("Cannot {} on an object that does not exist", operation.kind()),
        )
        .into()
    })
}

/// Migrations to apply before `operation` runs on `current`
pub fn run_before(
    operation: &Operation,
    current: Option<&ObjectDescription>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    match operation {
        Operation::DeleteObject => {
            let current = required(current, operation)?;
            let mut spawned = Vec::new();
            for field in &current.fields {
                spawned.extend(delete_link_object(&current.name, field, catalog)?);
            }
            for field in &current.fields {
                let mut targets = link_targets(field);
                targets.remove(&current.name);
                spawned.extend(remove_reverse_links(&current.name, &field.name, &targets, catalog)?);
            }
            Ok(spawned)
        }

        Operation::RemoveField { field } => {
            let current = required(current, operation)?;
            let mut spawned = delete_link_object(&current.name, field, catalog)?;
            spawned.extend(remove_reverse_links(
                &current.name,
                &field.name,
                &link_targets(field),
                catalog,
            )?);
            Ok(spawned)
        }

        // An explicit outer field replaces the automatic one for the same link
        Operation::AddField { field } if field.is_outer_link() => {
            let current = required(current, operation)?;
            Ok(current
                .fields
                .iter()
                .find(|existing| {
                    existing.is_outer_link()
                        && existing.outer_link_field == field.outer_link_field
                        && existing.link_meta == field.link_meta
                        && existing.field_type == field.field_type
                })
                .map(|existing| remove_reverse(&current.name, existing))
                .into_iter()
                .collect())
        }

        Operation::UpdateField { current: old, new } => {
            if old.is_inner_generic_link() && !new.is_inner_generic_link() {
                return Err(MigrationError::validation(
                    ErrorCode::NotImplemented,
                    format!(
                        "Changing generic field '{}' to another type is not supported",
                        old.name
                    ),
                )
                .into());
            }
            let current = required(current, operation)?;
            let mut spawned = Vec::new();
            if link_object_for(&current.name, old) != link_object_for(&current.name, new) {
                spawned.extend(delete_link_object(&current.name, old, catalog)?);
            }
            let dropped: BTreeSet<String> = link_targets(old)
                .difference(&link_targets(new))
                .cloned()
                .collect();
            spawned.extend(remove_reverse_links(&current.name, &old.name, &dropped, catalog)?);
            Ok(spawned)
        }

        _ => Ok(Vec::new()),
    }
}

/// Migrations to apply once `operation` has taken `current` to `updated`
pub fn run_after(
    operation: &Operation,
    current: Option<&ObjectDescription>,
    updated: Option<&ObjectDescription>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    match operation {
        Operation::CreateObject { .. } => {
            let updated = required(updated, operation)?;
            let mut spawned = Vec::new();
            for field in &updated.fields {
                spawned.extend(add_reverse_links(
                    &updated.name,
                    field,
                    &link_targets(field),
                    catalog,
                )?);
                spawned.extend(create_link_object(&updated.name, field, catalog)?);
            }
            Ok(spawned)
        }

        Operation::AddField { field } => {
            let updated = required(updated, operation)?;
            let mut spawned = add_reverse_links(&updated.name, field, &link_targets(field), catalog)?;
            spawned.extend(create_link_object(&updated.name, field, catalog)?);
            Ok(spawned)
        }

        Operation::UpdateField { current: old, new } => {
            let updated = required(updated, operation)?;
            let mut spawned = update_after_field_change(&updated.name, old, new, catalog)?;
            if link_object_for(&updated.name, old) != link_object_for(&updated.name, new) {
                spawned.extend(create_link_object(&updated.name, new, catalog)?);
            }
            Ok(spawned)
        }

        Operation::RenameObject { new_name } => {
            let current = required(current, operation)?;
            rename_reverse_links(&current.name, new_name, current, catalog)
        }

        _ => Ok(Vec::new()),
    }
}

fn update_after_field_change(
    owner: &str,
    old: &Field,
    new: &Field,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let old_targets = link_targets(old);
    let new_targets = link_targets(new);

    let added: BTreeSet<String> = new_targets.difference(&old_targets).cloned().collect();
    let mut spawned = add_reverse_links(owner, new, &added, catalog)?;

    for target in old_targets.intersection(&new_targets) {
        let object = catalog.get_required(target)?;
        match object.reverse_outer_field(owner, &old.name) {
            Some(reverse) => {
                let template = reverse_field(owner, new);
                let mut desired = reverse.clone();
                desired.outer_link_field = template.outer_link_field;
                desired.field_type = template.field_type;
                if desired != *reverse {
                    spawned.push(update_reverse(target, reverse, desired));
                }
            }
            None => spawned.push(add_reverse(target, owner, new)),
        }
    }
    Ok(spawned)
}

/// Point reverse fields on link targets at the new owner name
fn rename_reverse_links(
    old_name: &str,
    new_name: &str,
    current: &ObjectDescription,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<MigrationDescription>> {
    let mut spawned = Vec::new();

    for field in &current.fields {
        for target in link_targets(field) {
            // Self links were repointed by the rename itself
            let (target, owner) = if target == old_name {
                (new_name.to_string(), new_name)
            } else {
                (target, old_name)
            };

            let Some(object) = catalog.get(&target)? else {
                continue;
            };
            let Some(reverse) = object.reverse_outer_field(owner, &field.name) else {
                continue;
            };

            let mut desired = reverse.clone();
            desired.link_meta = Some(new_name.to_string());
            if reverse.name == reverse_link_name(old_name) {
                desired.name = reverse_link_name(new_name);
            }
            if desired != *reverse {
                spawned.push(update_reverse(&target, reverse, desired));
            }
        }
    }
    Ok(spawned)
}
