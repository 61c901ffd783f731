//! Physical shapes derived from catalog descriptions.
//!
//! Shapes are never stored. They are computed from a field (or an object) on
//! demand and diffed by [`crate::diff`] to produce DDL.

pub mod factory;

pub use factory::{column_type, default_expression, field_shape, sequence_for, table_shape};

use crate::catalog::OnDelete;
use crate::constants::{FOREIGN_KEY_PREFIX, UNIQUE_CONSTRAINT_SUFFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Numeric,
    Bool,
    Date,
    Timestamp,
    Time,
    /// Enumerated type, carrying the database type name
    Enum(String),
}

impl ColumnType {
    /// Same underlying type, ignoring the enum type name
    pub fn same_base(&self, other: &ColumnType) -> bool {
        match (self, other) {
            (ColumnType::Enum(_), ColumnType::Enum(_)) => true,
            (a, b) => a == b,
        }
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self {
            ColumnType::Enum(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub optional: bool,
    pub unique: bool,
    /// Rendered default expression
    pub default: Option<String>,
    pub enum_choices: Vec<String>,
}

impl Column {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            optional: true,
            unique: false,
            default: None,
            enum_choices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seq {
    pub name: String,
}

/// Inner foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifk {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: OnDelete,
}

impl Ifk {
    pub fn constraint_name(&self) -> String {
        format!(
            "{}{}_{}_{}",
            FOREIGN_KEY_PREFIX, self.from_column, self.to_table, self.to_column
        )
    }
}

pub fn unique_constraint_name(table: &str, column: &str) -> String {
    format!("{}_{}{}", table, column, UNIQUE_CONSTRAINT_SUFFIX)
}

/// Everything one field needs physically. Fields without storage have an
/// empty shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldShape {
    pub columns: Vec<Column>,
    pub seq: Option<Seq>,
    pub ifk: Option<Ifk>,
}

impl FieldShape {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.seq.is_none() && self.ifk.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableShape {
    pub table: String,
    pub primary_key: String,
    /// One entry per catalog field, in field order
    pub fields: Vec<FieldShape>,
}

impl TableShape {
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.fields.iter().flat_map(|f| f.columns.iter())
    }

    pub fn seqs(&self) -> impl Iterator<Item = &Seq> {
        self.fields.iter().filter_map(|f| f.seq.as_ref())
    }

    pub fn ifks(&self) -> impl Iterator<Item = &Ifk> {
        self.fields.iter().filter_map(|f| f.ifk.as_ref())
    }
}
