use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Bool,
    #[serde(rename = "datetime")]
    DateTime,
    Date,
    Time,
    Enum,
    Object,
    Objects,
    Array,
    Generic,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Enum => "enum",
            FieldType::Object => "object",
            FieldType::Objects => "objects",
            FieldType::Array => "array",
            FieldType::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// This object holds the reference
    Inner,
    /// Reverse side of another object's inner link
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnDelete {
    #[default]
    Cascade,
    SetNull,
    Restrict,
    SetDefault,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::SetDefault => "SET DEFAULT",
        }
    }
}

/// Field default: a constant or a named expression such as `nextval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Expr {
        func: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<serde_json::Value>,
    },
    Bool(bool),
    Number(f64),
    Text(String),
}

impl DefaultValue {
    pub fn expr(func: &str) -> Self {
        DefaultValue::Expr {
            func: func.to_string(),
            args: Vec::new(),
        }
    }

    pub fn is_nextval(&self) -> bool {
        matches!(self, DefaultValue::Expr { func, .. } if func == "nextval")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_meta: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_meta_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_link_field: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<OnDelete>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub now_on_create: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub now_on_update: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_choices: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub query_mode: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retrieve_mode: bool,
}

impl Field {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            link_type: None,
            link_meta: None,
            link_meta_list: Vec::new(),
            outer_link_field: None,
            optional: false,
            unique: false,
            on_delete: None,
            default: None,
            now_on_create: false,
            now_on_update: false,
            enum_choices: Vec::new(),
            query_mode: false,
            retrieve_mode: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Inner link to a single object
    pub fn link_to(mut self, link_meta: &str) -> Self {
        self.link_type = Some(LinkType::Inner);
        self.link_meta = Some(link_meta.to_string());
        self
    }

    /// Inner generic link to any of the listed objects
    pub fn generic_to(mut self, link_meta_list: &[&str]) -> Self {
        self.link_type = Some(LinkType::Inner);
        self.link_meta_list = link_meta_list.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_enum(mut self, choices: &[&str]) -> Self {
        self.enum_choices = choices.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_inner_object_link(&self) -> bool {
        self.field_type == FieldType::Object && self.link_type == Some(LinkType::Inner)
    }

    pub fn is_inner_generic_link(&self) -> bool {
        self.field_type == FieldType::Generic && self.link_type == Some(LinkType::Inner)
    }

    /// Many-to-many link kept in a separate link object
    pub fn is_objects_link(&self) -> bool {
        self.field_type == FieldType::Objects && self.link_meta.is_some()
    }

    pub fn is_outer_link(&self) -> bool {
        self.link_type == Some(LinkType::Outer)
    }

    pub fn effective_on_delete(&self) -> OnDelete {
        self.on_delete.unwrap_or_default()
    }

    pub fn link_meta_set(&self) -> BTreeSet<&str> {
        self.link_meta_list.iter().map(String::as_str).collect()
    }

    /// Fill in implied attributes so equal descriptions compare equal
    pub fn normalize(&mut self) {
        if (self.is_inner_object_link() || self.is_inner_generic_link()) && self.on_delete.is_none() {
            self.on_delete = Some(OnDelete::Cascade);
        }
        if matches!(self.default, Some(DefaultValue::Text(ref s)) if s.is_empty()) {
            self.default = None;
        }
    }

    /// True when any attribute tracked by migrations differs
    pub fn differs_from(&self, other: &Field) -> bool {
        self.name != other.name
            || self.field_type != other.field_type
            || self.link_type != other.link_type
            || self.link_meta != other.link_meta
            || self.link_meta_set() != other.link_meta_set()
            || self.optional != other.optional
            || self.unique != other.unique
            || self.effective_on_delete() != other.effective_on_delete()
            || self.default != other.default
            || self.now_on_create != other.now_on_create
            || self.now_on_update != other.now_on_update
            || self.enum_choices != other.enum_choices
    }
}
