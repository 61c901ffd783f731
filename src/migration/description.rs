//! Wire-level migration documents.
//!
//! A migration document is the JSON contract with callers:
//! `{"id", "applyTo", "dependsOn", "operations": [{"type", ...}]}`.

use crate::catalog::{Action, Field, ObjectDescription};
use crate::error::MigrationError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationDescription {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub apply_to: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub operations: Vec<OperationDescription>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl MigrationDescription {
    pub fn new(apply_to: &str, operations: Vec<OperationDescription>) -> Self {
        Self {
            id: String::new(),
            apply_to: apply_to.to_string(),
            depends_on: Vec::new(),
            operations,
            description: String::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read migration file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse migration file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MigrationError::invalid(format!("Malformed migration document: {}", e)).into())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Spawned companion migrations carry no id
    pub fn is_automatic(&self) -> bool {
        self.id.is_empty()
    }

    /// Object the migration targets, falling back to a created object's name
    pub fn object_name(&self) -> Result<String> {
        if !self.apply_to.is_empty() {
            return Ok(self.apply_to.clone());
        }
        match self.operations.first() {
            Some(OperationDescription::CreateObject { object }) => Ok(object.name.clone()),
            _ => Err(MigrationError::invalid(
                "Migration has neither applyTo nor a leading createObject operation",
            )
            .into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OperationDescription {
    CreateObject { object: ObjectDescription },
    RenameObject { object: ObjectDescription },
    DeleteObject { object: ObjectDescription },
    AddField { field: MigrationField },
    RemoveField { field: MigrationField },
    UpdateField { field: MigrationField },
    AddAction { action: MigrationAction },
    RemoveAction { action: MigrationAction },
    UpdateAction { action: MigrationAction },
}

impl OperationDescription {
    pub fn kind(&self) -> &'static str {
        match self {
            OperationDescription::CreateObject { .. } => "createObject",
            OperationDescription::RenameObject { .. } => "renameObject",
            OperationDescription::DeleteObject { .. } => "deleteObject",
            OperationDescription::AddField { .. } => "addField",
            OperationDescription::RemoveField { .. } => "removeField",
            OperationDescription::UpdateField { .. } => "updateField",
            OperationDescription::AddAction { .. } => "addAction",
            OperationDescription::RemoveAction { .. } => "removeAction",
            OperationDescription::UpdateAction { .. } => "updateAction",
        }
    }
}

/// A field plus the name it is matched by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationField {
    #[serde(flatten)]
    pub field: Field,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_name: String,
}

impl MigrationField {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            previous_name: String::new(),
        }
    }

    pub fn renamed(field: Field, previous_name: &str) -> Self {
        Self {
            field,
            previous_name: previous_name.to_string(),
        }
    }

    /// Name of the existing field this one replaces
    pub fn match_name(&self) -> &str {
        if self.previous_name.is_empty() {
            &self.field.name
        } else {
            &self.previous_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationAction {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_name: String,
}

impl MigrationAction {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            previous_name: String::new(),
        }
    }

    pub fn renamed(action: Action, previous_name: &str) -> Self {
        Self {
            action,
            previous_name: previous_name.to_string(),
        }
    }

    pub fn match_name(&self) -> &str {
        if self.previous_name.is_empty() {
            &self.action.name
        } else {
            &self.previous_name
        }
    }
}

/// Desired state of an object, as submitted to the constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationObjectDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub previous_name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: Vec<MigrationField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<MigrationAction>,
    #[serde(default)]
    pub cas: bool,
}

impl MigrationObjectDescription {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read object description {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse object description {}", path.display()))
    }

    /// Current name of the object this description evolves
    pub fn match_name(&self) -> &str {
        if self.previous_name.is_empty() {
            &self.name
        } else {
            &self.previous_name
        }
    }

    /// Plain object description, dropping the migration bookkeeping
    pub fn to_object(&self) -> ObjectDescription {
        ObjectDescription {
            name: self.name.clone(),
            key: self.key.clone(),
            fields: self.fields.iter().map(|f| f.field.clone()).collect(),
            actions: self.actions.iter().map(|a| a.action.clone()).collect(),
            cas: self.cas,
        }
    }
}

impl From<&ObjectDescription> for MigrationObjectDescription {
    fn from(object: &ObjectDescription) -> Self {
        Self {
            name: object.name.clone(),
            previous_name: String::new(),
            key: object.key.clone(),
            fields: object.fields.iter().cloned().map(MigrationField::new).collect(),
            actions: object.actions.iter().cloned().map(MigrationAction::new).collect(),
            cas: object.cas,
        }
    }
}
