use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Retrieve,
    Create,
    Remove,
    Update,
}

/// Notification hook attached to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub name: String,
    pub method: Method,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default)]
    pub active_if_not_root: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub include_values: BTreeMap<String, serde_json::Value>,
}

impl Action {
    pub fn new(name: &str, method: Method, protocol: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            protocol: protocol.to_string(),
            args: Vec::new(),
            active_if_not_root: false,
            include_values: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn differs_from(&self, other: &Action) -> bool {
        self.name != other.name
            || self.method != other.method
            || self.protocol != other.protocol
            || self.args != other.args
            || self.active_if_not_root != other.active_if_not_root
            || self.include_values != other.include_values
    }
}
