//! SQL rendering for table operations

use crate::diff::operations::{ColumnAction, TableOperation};
use crate::render::sql::{render_column_definition, render_column_type, render_create_table};
use crate::render::{RenderedSql, Safety, SqlRenderer, quote_ident};

impl SqlRenderer for TableOperation {
    fn to_sql(&self) -> Vec<RenderedSql> {
        match self {
            TableOperation::Create {
                name,
                columns,
                foreign_keys,
                primary_key,
            } => vec![RenderedSql {
                sql: render_create_table(name, columns, foreign_keys, primary_key),
                safety: Safety::Safe,
            }],
            TableOperation::Drop { name } => vec![RenderedSql {
                sql: format!("DROP TABLE {} RESTRICT;", quote_ident(name)),
                safety: Safety::Destructive,
            }],
            TableOperation::Rename { name, new_name } => vec![RenderedSql {
                sql: format!(
                    "ALTER TABLE {} RENAME TO {};",
                    quote_ident(name),
                    quote_ident(new_name)
                ),
                safety: Safety::Safe,
            }],
            TableOperation::Alter { name, actions } => actions
                .iter()
                .map(|action| render_column_action(action, name))
                .collect(),
        }
    }

    fn object_name(&self) -> String {
        match self {
            TableOperation::Create { name, .. }
            | TableOperation::Drop { name }
            | TableOperation::Rename { name, .. }
            | TableOperation::Alter { name, .. } => name.clone(),
        }
    }

    fn is_destructive(&self) -> bool {
        match self {
            TableOperation::Drop { .. } => true,
            TableOperation::Alter { actions, .. } => actions
                .iter()
                .any(|a| matches!(a, ColumnAction::Drop { .. })),
            _ => false,
        }
    }
}

fn render_column_action(action: &ColumnAction, table: &str) -> RenderedSql {
    let table = quote_ident(table);
    match action {
        ColumnAction::Add { column } => RenderedSql {
            sql: format!(
                "ALTER TABLE {} ADD COLUMN {};",
                table,
                render_column_definition(column)
            ),
            safety: Safety::Safe,
        },
        ColumnAction::Drop { name } => RenderedSql {
            sql: format!("ALTER TABLE {} DROP COLUMN {};", table, quote_ident(name)),
            safety: Safety::Destructive,
        },
        ColumnAction::Rename { name, new_name } => RenderedSql {
            sql: format!(
                "ALTER TABLE {} RENAME {} TO {};",
                table,
                quote_ident(name),
                quote_ident(new_name)
            ),
            safety: Safety::Safe,
        },
        ColumnAction::SetNotNull { name } => RenderedSql {
            sql: format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;",
                table,
                quote_ident(name)
            ),
            safety: Safety::Safe,
        },
        ColumnAction::DropNotNull { name } => RenderedSql {
            sql: format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL;",
                table,
                quote_ident(name)
            ),
            safety: Safety::Safe,
        },
        ColumnAction::SetDefault {
            name,
            default,
            cast,
        } => {
            let cast = match cast {
                Some(type_name) => format!("::{}", quote_ident(type_name)),
                None => String::new(),
            };
            RenderedSql {
                sql: format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}{};",
                    table,
                    quote_ident(name),
                    default,
                    cast
                ),
                safety: Safety::Safe,
            }
        }
        ColumnAction::DropDefault { name } => RenderedSql {
            sql: format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                table,
                quote_ident(name)
            ),
            safety: Safety::Safe,
        },
        ColumnAction::AlterType { name, column_type } => {
            let column = quote_ident(name);
            let new_type = render_column_type(column_type);
            // Existing values only convert to an enum through text
            let using = match column_type.enum_name() {
                Some(_) => format!(" USING ({}::text::{})", column, new_type),
                None => String::new(),
            };
            RenderedSql {
                sql: format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}{};",
                    table, column, new_type, using
                ),
                safety: Safety::Safe,
            }
        }
    }
}
