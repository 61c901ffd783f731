//! SQL rendering for unique and foreign key constraints

use crate::ddl::unique_constraint_name;
use crate::diff::operations::ConstraintOperation;
use crate::render::sql::render_foreign_key_clause;
use crate::render::{RenderedSql, Safety, SqlRenderer, quote_ident};

impl SqlRenderer for ConstraintOperation {
    fn to_sql(&self) -> Vec<RenderedSql> {
        let sql = match self {
            ConstraintOperation::AddUnique { table, column } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
                quote_ident(table),
                quote_ident(&unique_constraint_name(table, column)),
                quote_ident(column)
            ),
            ConstraintOperation::DropUnique { table, column } => format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                quote_ident(table),
                quote_ident(&unique_constraint_name(table, column))
            ),
            ConstraintOperation::RenameUnique {
                table,
                name,
                new_name,
            } => format!(
                "ALTER TABLE {} RENAME CONSTRAINT {} TO {};",
                quote_ident(table),
                quote_ident(name),
                quote_ident(new_name)
            ),
            ConstraintOperation::RenameForeignKey {
                table,
                name,
                new_name,
            } => format!(
                "ALTER TABLE {} RENAME CONSTRAINT {} TO {};",
                quote_ident(table),
                name,
                new_name
            ),
            ConstraintOperation::AddForeignKey { table, foreign_key } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {};",
                quote_ident(table),
                render_foreign_key_clause(foreign_key)
            ),
            ConstraintOperation::DropForeignKey { table, foreign_key } => format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                quote_ident(table),
                foreign_key.constraint_name()
            ),
        };

        let safety = if self.is_destructive() {
            Safety::Destructive
        } else {
            Safety::Safe
        };
        vec![RenderedSql { sql, safety }]
    }

    fn object_name(&self) -> String {
        match self {
            ConstraintOperation::AddUnique { table, column }
            | ConstraintOperation::DropUnique { table, column } => {
                unique_constraint_name(table, column)
            }
            ConstraintOperation::RenameUnique { name, .. }
            | ConstraintOperation::RenameForeignKey { name, .. } => name.clone(),
            ConstraintOperation::AddForeignKey { foreign_key, .. }
            | ConstraintOperation::DropForeignKey { foreign_key, .. } => {
                foreign_key.constraint_name()
            }
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(
            self,
            ConstraintOperation::DropUnique { .. } | ConstraintOperation::DropForeignKey { .. }
        )
    }
}
