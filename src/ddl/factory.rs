//! DDL factory: maps catalog fields onto columns, sequences and foreign keys.

use super::{Column, ColumnType, FieldShape, Ifk, Seq, TableShape};
use crate::catalog::{
    CatalogSyncer, DefaultValue, Field, FieldType, ObjectDescription, table_name,
};
use crate::constants::{GENERIC_KEY_COLUMN_SUFFIX, GENERIC_TYPE_COLUMN_SUFFIX, SEQUENCE_SUFFIX};
use crate::error::{ErrorCode, MigrationError};
use crate::render::escape_string;
use anyhow::Result;
use itertools::Itertools;

/// Column type for scalar field types; `None` for links and collections
pub fn column_type(field_type: FieldType, table: &str, column: &str) -> Option<ColumnType> {
    match field_type {
        FieldType::String => Some(ColumnType::Text),
        FieldType::Number => Some(ColumnType::Numeric),
        FieldType::Bool => Some(ColumnType::Bool),
        FieldType::Date => Some(ColumnType::Date),
        FieldType::DateTime => Some(ColumnType::Timestamp),
        FieldType::Time => Some(ColumnType::Time),
        FieldType::Enum => Some(ColumnType::Enum(format!("{}_{}", table, column))),
        FieldType::Object | FieldType::Objects | FieldType::Array | FieldType::Generic => None,
    }
}

/// Sequence backing a `nextval` default
pub fn sequence_for(owner: &str, field: &Field) -> Option<Seq> {
    match &field.default {
        Some(DefaultValue::Expr { func, args }) if func == "nextval" => {
            let name = args
                .first()
                .and_then(|arg| arg.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("{}_{}{}", table_name(owner), field.name, SEQUENCE_SUFFIX)
                });
            Some(Seq { name })
        }
        _ => None,
    }
}

/// Render a field default as a SQL expression
pub fn default_expression(owner: &str, field: &Field) -> Option<String> {
    match field.default.as_ref()? {
        DefaultValue::Expr { func, args } => Some(match func.as_str() {
            "nextval" => {
                let seq = sequence_for(owner, field)?;
                format!("nextval('{}')", seq.name)
            }
            "now" => "NOW()".to_string(),
            "current_date" => "CURRENT_DATE".to_string(),
            "current_timestamp" => "CURRENT_TIMESTAMP".to_string(),
            other => format!("{}({})", other, args.iter().map(literal).join(", ")),
        }),
        DefaultValue::Text(s) if s.is_empty() => None,
        DefaultValue::Text(s) => Some(escape_string(s)),
        DefaultValue::Number(n) => Some(n.to_string()),
        DefaultValue::Bool(b) => Some(b.to_string()),
    }
}

fn literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => escape_string(s),
        serde_json::Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Physical shape of one field of `owner`
pub fn field_shape(
    owner: &ObjectDescription,
    field: &Field,
    catalog: &impl CatalogSyncer,
) -> Result<FieldShape> {
    let table = owner.table_name();

    if field.is_outer_link() {
        return Ok(FieldShape::default());
    }

    if field.is_inner_object_link() {
        return inner_link_shape(owner, field, catalog);
    }

    if field.is_inner_generic_link() {
        let column = |suffix: &str| Column {
            name: format!("{}{}", field.name, suffix),
            column_type: ColumnType::Text,
            optional: field.optional,
            unique: false,
            default: None,
            enum_choices: Vec::new(),
        };
        return Ok(FieldShape {
            columns: vec![
                column(GENERIC_TYPE_COLUMN_SUFFIX),
                column(GENERIC_KEY_COLUMN_SUFFIX),
            ],
            seq: None,
            ifk: None,
        });
    }

    let Some(column_type) = column_type(field.field_type, &table, &field.name) else {
        return Ok(FieldShape::default());
    };

    let enum_choices = if column_type.enum_name().is_some() {
        field.enum_choices.clone()
    } else {
        Vec::new()
    };

    Ok(FieldShape {
        columns: vec![Column {
            name: field.name.clone(),
            column_type,
            optional: field.optional,
            unique: field.unique,
            default: default_expression(&owner.name, field),
            enum_choices,
        }],
        seq: sequence_for(&owner.name, field),
        ifk: None,
    })
}

fn inner_link_shape(
    owner: &ObjectDescription,
    field: &Field,
    catalog: &impl CatalogSyncer,
) -> Result<FieldShape> {
    let target_name = field.link_meta.as_deref().ok_or_else(|| {
        MigrationError::invalid(format!(
            "Field '{}' of object '{}' is a link without linkMeta",
            field.name, owner.name
        ))
    })?;

    let target = if target_name == owner.name {
        owner.clone()
    } else {
        catalog.get(target_name)?.ok_or_else(|| {
            MigrationError::validation(
                ErrorCode::ObjectNotFound,
                format!(
                    "Field '{}' of object '{}' links to unknown object '{}'",
                    field.name, owner.name, target_name
                ),
            )
        })?
    };

    let key = target.key_field().ok_or_else(|| {
        MigrationError::invalid(format!(
            "Object '{}' has no key field '{}'",
            target.name, target.key
        ))
    })?;

    let target_table = target.table_name();
    let key_type = column_type(key.field_type, &target_table, &key.name).ok_or_else(|| {
        MigrationError::invalid(format!(
            "Key field '{}' of object '{}' has non-scalar type '{}'",
            key.name,
            target.name,
            key.field_type.as_str()
        ))
    })?;

    Ok(FieldShape {
        columns: vec![Column {
            name: field.name.clone(),
            column_type: key_type,
            optional: field.optional,
            unique: field.unique,
            default: None,
            enum_choices: Vec::new(),
        }],
        seq: None,
        ifk: Some(Ifk {
            from_column: field.name.clone(),
            to_table: target_table,
            to_column: key.name.clone(),
            on_delete: field.effective_on_delete(),
        }),
    })
}

/// Physical shape of a whole object
pub fn table_shape(object: &ObjectDescription, catalog: &impl CatalogSyncer) -> Result<TableShape> {
    let fields = object
        .fields
        .iter()
        .map(|field| field_shape(object, field, catalog))
        .collect::<Result<Vec<_>>>()?;

    Ok(TableShape {
        table: object.table_name(),
        primary_key: object.key.clone(),
        fields,
    })
}
