//! Unique and foreign key constraint operations

use crate::ddl::Ifk;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintOperation {
    AddUnique {
        table: String,
        column: String,
    },
    DropUnique {
        table: String,
        column: String,
    },
    /// Keep the implicit `<table>_<column>_key` name in step with a rename
    RenameUnique {
        table: String,
        name: String,
        new_name: String,
    },
    /// Keep a derived `fk_` name in step with a table rename
    RenameForeignKey {
        table: String,
        name: String,
        new_name: String,
    },
    AddForeignKey {
        table: String,
        foreign_key: Ifk,
    },
    DropForeignKey {
        table: String,
        foreign_key: Ifk,
    },
}
