use super::action::Action;
use super::field::Field;
use crate::constants::{LINK_OBJECT_SEPARATOR, REVERSE_LINK_SUFFIX, TABLE_PREFIX};
use serde::{Deserialize, Serialize};

/// Catalog description of one data object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescription {
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub cas: bool,
}

impl ObjectDescription {
    pub fn new(name: &str, key: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            fields,
            actions: Vec::new(),
            cas: false,
        }
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn key_field(&self) -> Option<&Field> {
        self.find_field(&self.key)
    }

    pub fn table_name(&self) -> String {
        table_name(&self.name)
    }

    pub fn normalize(&mut self) {
        for field in &mut self.fields {
            field.normalize();
        }
    }

    /// Reverse outer field on this object that mirrors `owner.field_name`
    pub fn reverse_outer_field(&self, owner: &str, field_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| {
            f.is_outer_link()
                && f.link_meta.as_deref() == Some(owner)
                && f.outer_link_field.as_deref() == Some(field_name)
        })
    }
}

/// Physical table backing an object
pub fn table_name(object_name: &str) -> String {
    format!("{}{}", TABLE_PREFIX, object_name)
}

/// Name of the automatically maintained outer field pointing back at `owner`
pub fn reverse_link_name(owner: &str) -> String {
    format!("{}{}", owner, REVERSE_LINK_SUFFIX)
}

/// Link object holding the pairs of an `objects` field of `owner`
pub fn link_object_name(owner: &str, target: &str) -> String {
    format!("{}{}{}", owner, LINK_OBJECT_SEPARATOR, target)
}
