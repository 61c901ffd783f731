use crate::ddl::{Column, ColumnType, Ifk};
use crate::render::quote_ident;

use super::constraint::render_foreign_key_clause;

pub fn render_column_type(column_type: &ColumnType) -> String {
    match column_type {
        ColumnType::Text => "text".to_string(),
        ColumnType::Numeric => "numeric".to_string(),
        ColumnType::Bool => "bool".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::Timestamp => "timestamp with time zone".to_string(),
        ColumnType::Time => "time with time zone".to_string(),
        ColumnType::Enum(name) => quote_ident(name),
    }
}

/// `"name" type [NOT NULL] [UNIQUE] [DEFAULT expr]`
pub fn render_column_definition(column: &Column) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        render_column_type(&column.column_type)
    );
    if !column.optional {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    sql
}

pub fn render_create_table(
    name: &str,
    columns: &[Column],
    foreign_keys: &[Ifk],
    primary_key: &str,
) -> String {
    let mut parts: Vec<String> = columns.iter().map(render_column_definition).collect();
    parts.extend(
        foreign_keys
            .iter()
            .map(|fk| format!("CONSTRAINT {}", render_foreign_key_clause(fk))),
    );
    if !primary_key.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", quote_ident(primary_key)));
    }

    format!("CREATE TABLE {} ({});", quote_ident(name), parts.join(", "))
}
