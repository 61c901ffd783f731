use crate::catalog::{CatalogSyncer, Field, ObjectDescription};
use crate::ddl::{FieldShape, field_shape};
use crate::diff::diff_field;
use crate::diff::operations::DdlStep;
use crate::error::MigrationError;
use anyhow::Result;

fn missing_field(object: &ObjectDescription, name: &str) -> anyhow::Error {
    MigrationError::invalid(format!("Object '{}' has no field '{}'", object.name, name)).into()
}

pub(super) fn add(current: &ObjectDescription, field: &Field) -> Result<ObjectDescription> {
    if let Some(existing) = current.find_field(&field.name) {
        // Two outer links may share a name when they mirror different fields;
        // the first one stays.
        if existing.is_outer_link()
            && field.is_outer_link()
            && existing.outer_link_field != field.outer_link_field
        {
            return Ok(current.clone());
        }
        return Err(MigrationError::invalid(format!(
            "Object '{}' already has field '{}'",
            current.name, field.name
        ))
        .into());
    }

    let mut updated = current.clone();
    let mut field = field.clone();
    field.normalize();
    updated.fields.push(field);
    Ok(updated)
}

pub(super) fn remove(current: &ObjectDescription, name: &str) -> Result<ObjectDescription> {
    if current.find_field(name).is_none() {
        return Err(missing_field(current, name));
    }
    if current.key == name {
        return Err(MigrationError::invalid(format!(
            "Cannot remove key field '{}' of object '{}'",
            name, current.name
        ))
        .into());
    }

    let mut updated = current.clone();
    updated.fields.retain(|f| f.name != name);
    Ok(updated)
}

/// Replace `name` in place, keeping the field position
pub(super) fn update(
    current: &ObjectDescription,
    name: &str,
    new: &Field,
) -> Result<ObjectDescription> {
    let Some(position) = current.fields.iter().position(|f| f.name == name) else {
        return Err(missing_field(current, name));
    };
    if new.name != name && current.find_field(&new.name).is_some() {
        return Err(MigrationError::invalid(format!(
            "Cannot rename field '{}' of object '{}' to '{}': the name is taken",
            name, current.name, new.name
        ))
        .into());
    }

    let mut updated = current.clone();
    let mut field = new.clone();
    field.normalize();
    updated.fields[position] = field;
    if current.key == name {
        updated.key = new.name.clone();
    }
    Ok(updated)
}

fn shape_of(
    object: Option<&ObjectDescription>,
    name: Option<&str>,
    catalog: &impl CatalogSyncer,
) -> Result<Option<FieldShape>> {
    let (Some(object), Some(name)) = (object, name) else {
        return Ok(None);
    };
    let Some(field) = object.find_field(name) else {
        return Ok(None);
    };
    let shape = field_shape(object, field, catalog)?;
    Ok((!shape.is_empty()).then_some(shape))
}

/// Steps taking field `old_name` of `current` to field `new_name` of `updated`
pub(super) fn ddl_steps(
    current: Option<&ObjectDescription>,
    old_name: Option<&str>,
    updated: Option<&ObjectDescription>,
    new_name: Option<&str>,
    catalog: &impl CatalogSyncer,
) -> Result<Vec<DdlStep>> {
    let Some(table) = updated.or(current).map(ObjectDescription::table_name) else {
        return Ok(Vec::new());
    };

    // An add that left the object untouched has nothing to build
    if let (Some(c), Some(u)) = (current, updated)
        && c == u
    {
        return Ok(Vec::new());
    }

    let old = shape_of(current, old_name, catalog)?;
    let new = shape_of(updated, new_name, catalog)?;
    diff_field(&table, old.as_ref(), new.as_ref())
}
