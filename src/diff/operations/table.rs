//! Table operations

use crate::ddl::{Column, ColumnType, Ifk};

#[derive(Debug, Clone, PartialEq)]
pub enum TableOperation {
    Create {
        name: String,
        columns: Vec<Column>,
        foreign_keys: Vec<Ifk>,
        primary_key: String,
    },
    Drop {
        name: String,
    },
    Rename {
        name: String,
        new_name: String,
    },
    Alter {
        name: String,
        actions: Vec<ColumnAction>,
    },
}

/// Column-level actions within ALTER TABLE
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAction {
    Add { column: Column },
    Drop { name: String },
    Rename { name: String, new_name: String },
    SetNotNull { name: String },
    DropNotNull { name: String },
    SetDefault {
        name: String,
        default: String,
        /// Enum type to cast the default to
        cast: Option<String>,
    },
    DropDefault { name: String },
    AlterType { name: String, column_type: ColumnType },
}
