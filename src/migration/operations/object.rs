//! Object-level operations act on the whole table.

use crate::catalog::{CatalogSyncer, ObjectDescription};
use crate::ddl::table_shape;
use crate::diff::diff_table;
use crate::diff::operations::DdlStep;
use crate::error::{ErrorCode, MigrationError};
use crate::render::is_valid_identifier;
use anyhow::Result;
use std::collections::BTreeSet;

/// Object names end up in file and table names
fn check_name(name: &str) -> Result<()> {
    if !is_valid_identifier(name) {
        return Err(MigrationError::invalid(format!(
            "Invalid object name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
            name
        ))
        .into());
    }
    Ok(())
}

pub(super) fn create(
    current: Option<&ObjectDescription>,
    object: &ObjectDescription,
) -> Result<ObjectDescription> {
    if current.is_some() {
        return Err(MigrationError::validation(
            ErrorCode::Duplicated,
            format!("Object '{}' already exists", object.name),
        )
        .into());
    }
    check_name(&object.name)?;

    let mut seen = BTreeSet::new();
    if let Some(field) = object.fields.iter().find(|f| !seen.insert(f.name.as_str())) {
        return Err(MigrationError::invalid(format!(
            "Object '{}' declares field '{}' more than once",
            object.name, field.name
        ))
        .into());
    }
    if object.key_field().is_none() {
        return Err(MigrationError::invalid(format!(
            "Object '{}' has no key field '{}'",
            object.name, object.key
        ))
        .into());
    }

    let mut created = object.clone();
    created.normalize();
    Ok(created)
}

/// Rename the object and repoint its self-links
pub(super) fn rename(current: &ObjectDescription, new_name: &str) -> Result<ObjectDescription> {
    check_name(new_name)?;
    if new_name == current.name {
        return Err(MigrationError::invalid(format!(
            "Object '{}' is already named '{}'",
            current.name, new_name
        ))
        .into());
    }

    let mut renamed = current.clone();
    renamed.name = new_name.to_string();
    for field in &mut renamed.fields {
        if field.link_meta.as_deref() == Some(current.name.as_str()) {
            field.link_meta = Some(new_name.to_string());
        }
        for target in &mut field.link_meta_list {
            if *target == current.name {
                *target = new_name.to_string();
            }
        }
    }
    Ok(renamed)
}

pub(super) fn ddl_steps(
    current: Option<&ObjectDescription>,
    updated: Option<&ObjectDescription>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<DdlStep>> {
    let old = current.map(|o| table_shape(o, catalog)).transpose()?;
    let new = updated.map(|o| table_shape(o, catalog)).transpose()?;
    Ok(diff_table(old.as_ref(), new.as_ref()))
}
