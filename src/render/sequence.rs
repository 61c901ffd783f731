//! SQL rendering for sequence operations

use crate::diff::operations::SequenceOperation;
use crate::render::{RenderedSql, Safety, SqlRenderer, quote_ident};

impl SqlRenderer for SequenceOperation {
    fn to_sql(&self) -> Vec<RenderedSql> {
        match self {
            SequenceOperation::Create { name } => vec![RenderedSql {
                sql: format!("CREATE SEQUENCE IF NOT EXISTS {};", quote_ident(name)),
                safety: Safety::Safe,
            }],
            SequenceOperation::Drop { name } => vec![RenderedSql {
                sql: format!("DROP SEQUENCE {} CASCADE;", quote_ident(name)),
                safety: Safety::Destructive,
            }],
            SequenceOperation::Rename { name, new_name } => vec![RenderedSql {
                sql: format!(
                    "ALTER SEQUENCE {} RENAME TO {};",
                    quote_ident(name),
                    quote_ident(new_name)
                ),
                safety: Safety::Safe,
            }],
        }
    }

    fn object_name(&self) -> String {
        match self {
            SequenceOperation::Create { name }
            | SequenceOperation::Drop { name }
            | SequenceOperation::Rename { name, .. } => name.clone(),
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(self, SequenceOperation::Drop { .. })
    }
}
