//! SQL rendering for enumerated types

use crate::diff::operations::EnumTypeOperation;
use crate::render::{RenderedSql, Safety, SqlRenderer, escape_string, quote_ident};

impl SqlRenderer for EnumTypeOperation {
    fn to_sql(&self) -> Vec<RenderedSql> {
        match self {
            EnumTypeOperation::Create { name, choices } => {
                let values = choices
                    .iter()
                    .map(|c| escape_string(c))
                    .collect::<Vec<_>>()
                    .join(", ");
                // CREATE TYPE has no IF NOT EXISTS form
                vec![RenderedSql {
                    sql: format!(
                        "DO $$ BEGIN IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = {}) THEN CREATE TYPE {} AS ENUM ({}); END IF; END$$;",
                        escape_string(name),
                        quote_ident(name),
                        values
                    ),
                    safety: Safety::Safe,
                }]
            }
            EnumTypeOperation::Drop { name } => vec![RenderedSql {
                sql: format!("DROP TYPE IF EXISTS {};", quote_ident(name)),
                safety: Safety::Destructive,
            }],
            EnumTypeOperation::Rename { name, new_name } => vec![RenderedSql {
                sql: format!(
                    "ALTER TYPE {} RENAME TO {};",
                    quote_ident(name),
                    quote_ident(new_name)
                ),
                safety: Safety::Safe,
            }],
            EnumTypeOperation::AddValue { name, value } => vec![RenderedSql {
                sql: format!(
                    "ALTER TYPE {} ADD VALUE IF NOT EXISTS {};",
                    quote_ident(name),
                    escape_string(value)
                ),
                safety: Safety::Safe,
            }],
        }
    }

    fn object_name(&self) -> String {
        match self {
            EnumTypeOperation::Create { name, .. }
            | EnumTypeOperation::Drop { name }
            | EnumTypeOperation::Rename { name, .. }
            | EnumTypeOperation::AddValue { name, .. } => name.clone(),
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(self, EnumTypeOperation::Drop { .. })
    }
}
