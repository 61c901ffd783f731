//! Actions live in the catalog only.

use crate::catalog::{Action, ObjectDescription};
use crate::error::MigrationError;
use anyhow::Result;

fn missing_action(object: &ObjectDescription, name: &str) -> anyhow::Error {
    MigrationError::invalid(format!("Object '{}' has no action '{}'", object.name, name)).into()
}

pub(super) fn add(current: &ObjectDescription, action: &Action) -> Result<ObjectDescription> {
    if current.find_action(&action.name).is_some() {
        return Err(MigrationError::invalid(format!(
            "Object '{}' already has action '{}'",
            current.name, action.name
        ))
        .into());
    }
    let mut updated = current.clone();
    updated.actions.push(action.clone());
    Ok(updated)
}

pub(super) fn remove(current: &ObjectDescription, name: &str) -> Result<ObjectDescription> {
    if current.find_action(name).is_none() {
        return Err(missing_action(current, name));
    }
    let mut updated = current.clone();
    updated.actions.retain(|a| a.name != name);
    Ok(updated)
}

pub(super) fn update(
    current: &ObjectDescription,
    name: &str,
    new: &Action,
) -> Result<ObjectDescription> {
    let Some(position) = current.actions.iter().position(|a| a.name == name) else {
        return Err(missing_action(current, name));
    };
    if new.name != name && current.find_action(&new.name).is_some() {
        return Err(MigrationError::invalid(format!(
            "Cannot rename action '{}' of object '{}' to '{}': the name is taken",
            name, current.name, new.name
        ))
        .into());
    }
    let mut updated = current.clone();
    updated.actions[position] = new.clone();
    Ok(updated)
}
