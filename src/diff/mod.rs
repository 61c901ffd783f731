//! DDL diff layer: before/after physical shapes in, ordered DDL steps out.

pub mod fields;
pub mod operations;
pub mod tables;

pub use fields::diff_field;
pub use tables::diff_table;

use crate::ddl::{Column, ColumnType};
use crate::diff::operations::{DdlStep, EnumTypeOperation};

fn create_enum_steps<'a>(columns: impl Iterator<Item = &'a Column>) -> Vec<DdlStep> {
    columns
        .filter_map(|column| match &column.column_type {
            ColumnType::Enum(name) => Some(DdlStep::EnumType(EnumTypeOperation::Create {
                name: name.clone(),
                choices: column.enum_choices.clone(),
            })),
            _ => None,
        })
        .collect()
}

fn drop_enum_steps<'a>(columns: impl Iterator<Item = &'a Column>) -> Vec<DdlStep> {
    columns
        .filter_map(|column| {
            column.column_type.enum_name().map(|name| {
                DdlStep::EnumType(EnumTypeOperation::Drop {
                    name: name.to_string(),
                })
            })
        })
        .collect()
}
