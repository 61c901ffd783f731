//! Field-level DDL diff.
//!
//! Each axis (name, nullability, type, default, uniqueness, foreign key) is
//! compared independently and only the statements it implies are emitted.
//! Statements address the column by its old name until the rename step and
//! by its new name afterwards.

use super::{create_enum_steps, drop_enum_steps};
use crate::ddl::{Column, FieldShape, unique_constraint_name};
use crate::diff::operations::{
    ColumnAction, ConstraintOperation, DdlStep, EnumTypeOperation, SequenceOperation,
};
use crate::error::MigrationError;
use anyhow::Result;

pub fn diff_field(
    table: &str,
    old: Option<&FieldShape>,
    new: Option<&FieldShape>,
) -> Result<Vec<DdlStep>> {
    match (old, new) {
        (None, None) => Ok(Vec::new()),
        (None, Some(new)) => Ok(add_field(table, new)),
        (Some(old), None) => Ok(remove_field(table, old)),
        (Some(old), Some(new)) if old.columns.len() != new.columns.len() => {
            let mut steps = remove_field(table, old);
            steps.extend(add_field(table, new));
            Ok(steps)
        }
        (Some(old), Some(new)) => update_field(table, old, new),
    }
}

/// Sequence, then column, then constraint
fn add_field(table: &str, shape: &FieldShape) -> Vec<DdlStep> {
    let mut steps = create_enum_steps(shape.columns.iter());

    if let Some(seq) = &shape.seq {
        steps.push(DdlStep::Sequence(SequenceOperation::Create {
            name: seq.name.clone(),
        }));
    }

    for column in &shape.columns {
        steps.push(DdlStep::alter(
            table,
            ColumnAction::Add {
                column: column.clone(),
            },
        ));
    }

    if let Some(ifk) = &shape.ifk {
        steps.push(DdlStep::Constraint(ConstraintOperation::AddForeignKey {
            table: table.to_string(),
            foreign_key: ifk.clone(),
        }));
    }

    steps
}

/// Constraint, then column, then sequence
fn remove_field(table: &str, shape: &FieldShape) -> Vec<DdlStep> {
    let mut steps = Vec::new();

    if let Some(ifk) = &shape.ifk {
        steps.push(DdlStep::Constraint(ConstraintOperation::DropForeignKey {
            table: table.to_string(),
            foreign_key: ifk.clone(),
        }));
    }

    for column in &shape.columns {
        steps.push(DdlStep::alter(
            table,
            ColumnAction::Drop {
                name: column.name.clone(),
            },
        ));
    }

    if let Some(seq) = &shape.seq {
        steps.push(DdlStep::Sequence(SequenceOperation::Drop {
            name: seq.name.clone(),
        }));
    }

    steps.extend(drop_enum_steps(shape.columns.iter()));
    steps
}

fn update_field(table: &str, old: &FieldShape, new: &FieldShape) -> Result<Vec<DdlStep>> {
    let pairs: Vec<(&Column, &Column)> = old.columns.iter().zip(new.columns.iter()).collect();
    let mut steps = Vec::new();
    let mut defaults_dropped = Vec::with_capacity(pairs.len());

    for (c0, c1) in &pairs {
        defaults_dropped.push(alter_column(table, c0, c1, &mut steps));
    }

    match (&old.seq, &new.seq) {
        (Some(s0), Some(s1)) if s0.name != s1.name => {
            steps.push(DdlStep::Sequence(SequenceOperation::Rename {
                name: s0.name.clone(),
                new_name: s1.name.clone(),
            }));
        }
        (None, Some(s1)) => {
            steps.push(DdlStep::Sequence(SequenceOperation::Create {
                name: s1.name.clone(),
            }));
        }
        _ => {}
    }

    for ((c0, c1), dropped) in pairs.iter().zip(defaults_dropped) {
        if let Some(default) = &c1.default
            && (dropped || c0.default.as_ref() != Some(default))
        {
            steps.push(DdlStep::alter(
                table,
                ColumnAction::SetDefault {
                    name: c1.name.clone(),
                    default: default.clone(),
                    cast: c1.column_type.enum_name().map(str::to_string),
                },
            ));
        }
    }

    if let (Some(s0), None) = (&old.seq, &new.seq) {
        steps.push(DdlStep::Sequence(SequenceOperation::Drop {
            name: s0.name.clone(),
        }));
    }

    for (c0, c1) in &pairs {
        extend_enum_choices(c0, c1, &mut steps)?;

        if c0.unique && !c1.unique {
            steps.push(DdlStep::Constraint(ConstraintOperation::DropUnique {
                table: table.to_string(),
                column: c0.name.clone(),
            }));
        } else if !c0.unique && c1.unique {
            steps.push(DdlStep::Constraint(ConstraintOperation::AddUnique {
                table: table.to_string(),
                column: c1.name.clone(),
            }));
        }
    }

    if old.ifk != new.ifk {
        if let Some(ifk) = &old.ifk {
            steps.push(DdlStep::Constraint(ConstraintOperation::DropForeignKey {
                table: table.to_string(),
                foreign_key: ifk.clone(),
            }));
        }
        if let Some(ifk) = &new.ifk {
            steps.push(DdlStep::Constraint(ConstraintOperation::AddForeignKey {
                table: table.to_string(),
                foreign_key: ifk.clone(),
            }));
        }
    }

    Ok(steps)
}

/// Default, type, nullability and name changes of one column. Returns whether
/// the old default was dropped.
fn alter_column(table: &str, c0: &Column, c1: &Column, steps: &mut Vec<DdlStep>) -> bool {
    let type_changed = !c0.column_type.same_base(&c1.column_type);

    let drop_default = c0.default.is_some() && (c1.default.is_none() || type_changed);
    if drop_default {
        steps.push(DdlStep::alter(
            table,
            ColumnAction::DropDefault {
                name: c0.name.clone(),
            },
        ));
    }

    if type_changed {
        if let Some(name) = c1.column_type.enum_name() {
            steps.push(DdlStep::EnumType(EnumTypeOperation::Create {
                name: name.to_string(),
                choices: c1.enum_choices.clone(),
            }));
        }
        steps.push(DdlStep::alter(
            table,
            ColumnAction::AlterType {
                name: c0.name.clone(),
                column_type: c1.column_type.clone(),
            },
        ));
        if let Some(name) = c0.column_type.enum_name() {
            steps.push(DdlStep::EnumType(EnumTypeOperation::Drop {
                name: name.to_string(),
            }));
        }
    }

    if c0.optional != c1.optional {
        let name = c0.name.clone();
        let action = if c1.optional {
            ColumnAction::DropNotNull { name }
        } else {
            ColumnAction::SetNotNull { name }
        };
        steps.push(DdlStep::alter(table, action));
    }

    if c0.name != c1.name {
        steps.push(DdlStep::alter(
            table,
            ColumnAction::Rename {
                name: c0.name.clone(),
                new_name: c1.name.clone(),
            },
        ));

        if !type_changed
            && let (Some(n0), Some(n1)) = (c0.column_type.enum_name(), c1.column_type.enum_name())
            && n0 != n1
        {
            steps.push(DdlStep::EnumType(EnumTypeOperation::Rename {
                name: n0.to_string(),
                new_name: n1.to_string(),
            }));
        }

        if c0.unique && c1.unique {
            steps.push(DdlStep::Constraint(ConstraintOperation::RenameUnique {
                table: table.to_string(),
                name: unique_constraint_name(table, &c0.name),
                new_name: unique_constraint_name(table, &c1.name),
            }));
        }
    }

    drop_default
}

/// Enum values can be added but never removed
fn extend_enum_choices(c0: &Column, c1: &Column, steps: &mut Vec<DdlStep>) -> Result<()> {
    let (Some(_), Some(name)) = (c0.column_type.enum_name(), c1.column_type.enum_name()) else {
        return Ok(());
    };
    if c0.enum_choices == c1.enum_choices {
        return Ok(());
    }

    if let Some(removed) = c0.enum_choices.iter().find(|c| !c1.enum_choices.contains(c)) {
        return Err(MigrationError::invalid(format!(
            "Cannot remove choice '{}' from enum column '{}'",
            removed, c0.name
        ))
        .into());
    }

    for value in c1.enum_choices.iter().filter(|c| !c0.enum_choices.contains(c)) {
        steps.push(DdlStep::EnumType(EnumTypeOperation::AddValue {
            name: name.to_string(),
            value: value.clone(),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OnDelete;
    use crate::ddl::{ColumnType, Ifk, Seq};
    use crate::diff::operations::{SqlRenderer, render_steps};
    use crate::error::{ErrorCode, error_code};
    use pretty_assertions::assert_eq;

    fn shape(column: Column) -> FieldShape {
        FieldShape {
            columns: vec![column],
            seq: None,
            ifk: None,
        }
    }

    fn sql(steps: &[DdlStep]) -> Vec<String> {
        render_steps(steps).into_iter().map(|r| r.sql).collect()
    }

    fn sequence_number() -> FieldShape {
        let mut column = Column::new("number", ColumnType::Numeric);
        column.default = Some("nextval('o_a_number_seq')".to_string());
        FieldShape {
            columns: vec![column],
            seq: Some(Seq {
                name: "o_a_number_seq".to_string(),
            }),
            ifk: None,
        }
    }

    #[test]
    fn test_add_field_creates_sequence_before_column() -> Result<()> {
        let steps = diff_field("o_a", None, Some(&sequence_number()))?;
        assert_eq!(
            sql(&steps),
            vec![
                "CREATE SEQUENCE IF NOT EXISTS \"o_a_number_seq\";",
                "ALTER TABLE \"o_a\" ADD COLUMN \"number\" numeric DEFAULT nextval('o_a_number_seq');",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_remove_field_drops_constraint_first() -> Result<()> {
        let mut old = shape(Column::new("owner", ColumnType::Numeric));
        old.ifk = Some(Ifk {
            from_column: "owner".to_string(),
            to_table: "o_user".to_string(),
            to_column: "id".to_string(),
            on_delete: OnDelete::Cascade,
        });

        let steps = diff_field("o_a", Some(&old), None)?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" DROP CONSTRAINT fk_owner_o_user_id;",
                "ALTER TABLE \"o_a\" DROP COLUMN \"owner\";",
            ]
        );
        assert!(steps.iter().all(|s| s.is_destructive()));
        Ok(())
    }

    #[test]
    fn test_sequence_number_to_required_text() -> Result<()> {
        let mut column = Column::new("new-number", ColumnType::Text);
        column.optional = false;
        let new = shape(column);

        let steps = diff_field("o_a", Some(&sequence_number()), Some(&new))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" ALTER COLUMN \"number\" DROP DEFAULT;",
                "ALTER TABLE \"o_a\" ALTER COLUMN \"number\" SET DATA TYPE text;",
                "ALTER TABLE \"o_a\" ALTER COLUMN \"number\" SET NOT NULL;",
                "ALTER TABLE \"o_a\" RENAME \"number\" TO \"new-number\";",
                "DROP SEQUENCE \"o_a_number_seq\" CASCADE;",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_nullability_change_is_one_statement() -> Result<()> {
        let old = sequence_number();
        let mut new = old.clone();
        new.columns[0].optional = false;

        let steps = diff_field("o_a", Some(&old), Some(&new))?;
        assert_eq!(
            sql(&steps),
            vec!["ALTER TABLE \"o_a\" ALTER COLUMN \"number\" SET NOT NULL;"]
        );
        Ok(())
    }

    #[test]
    fn test_identical_shapes_produce_nothing() -> Result<()> {
        let shape = sequence_number();
        assert!(diff_field("o_a", Some(&shape), Some(&shape))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_adding_sequence_default() -> Result<()> {
        let old = shape(Column::new("number", ColumnType::Numeric));
        let steps = diff_field("o_a", Some(&old), Some(&sequence_number()))?;
        assert_eq!(
            sql(&steps),
            vec![
                "CREATE SEQUENCE IF NOT EXISTS \"o_a_number_seq\";",
                "ALTER TABLE \"o_a\" ALTER COLUMN \"number\" SET DEFAULT nextval('o_a_number_seq');",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_rename_unique_column_renames_constraint() -> Result<()> {
        let mut c0 = Column::new("code", ColumnType::Text);
        c0.unique = true;
        let mut c1 = c0.clone();
        c1.name = "ref".to_string();

        let steps = diff_field("o_a", Some(&shape(c0)), Some(&shape(c1)))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" RENAME \"code\" TO \"ref\";",
                "ALTER TABLE \"o_a\" RENAME CONSTRAINT \"o_a_code_key\" TO \"o_a_ref_key\";",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unique_toggle() -> Result<()> {
        let c0 = Column::new("code", ColumnType::Text);
        let mut c1 = c0.clone();
        c1.unique = true;

        let added = diff_field("o_a", Some(&shape(c0.clone())), Some(&shape(c1.clone())))?;
        assert_eq!(
            sql(&added),
            vec!["ALTER TABLE \"o_a\" ADD CONSTRAINT \"o_a_code_key\" UNIQUE (\"code\");"]
        );

        let dropped = diff_field("o_a", Some(&shape(c1)), Some(&shape(c0)))?;
        assert_eq!(
            sql(&dropped),
            vec!["ALTER TABLE \"o_a\" DROP CONSTRAINT \"o_a_code_key\";"]
        );
        Ok(())
    }

    #[test]
    fn test_text_to_enum_creates_type_first() -> Result<()> {
        let mut c0 = Column::new("status", ColumnType::Text);
        c0.default = Some("'new'".to_string());
        let mut c1 = Column::new("status", ColumnType::Enum("o_a_status".to_string()));
        c1.default = Some("'new'".to_string());
        c1.enum_choices = vec!["new".to_string(), "done".to_string()];

        let steps = diff_field("o_a", Some(&shape(c0)), Some(&shape(c1)))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" ALTER COLUMN \"status\" DROP DEFAULT;",
                "DO $$ BEGIN IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'o_a_status') THEN CREATE TYPE \"o_a_status\" AS ENUM ('new', 'done'); END IF; END$$;",
                "ALTER TABLE \"o_a\" ALTER COLUMN \"status\" SET DATA TYPE \"o_a_status\" USING (\"status\"::text::\"o_a_status\");",
                "ALTER TABLE \"o_a\" ALTER COLUMN \"status\" SET DEFAULT 'new'::\"o_a_status\";",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_enum_choices_extend_and_rename() -> Result<()> {
        let mut c0 = Column::new("status", ColumnType::Enum("o_a_status".to_string()));
        c0.enum_choices = vec!["new".to_string()];
        let mut c1 = Column::new("state", ColumnType::Enum("o_a_state".to_string()));
        c1.enum_choices = vec!["new".to_string(), "done".to_string()];

        let steps = diff_field("o_a", Some(&shape(c0)), Some(&shape(c1)))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" RENAME \"status\" TO \"state\";",
                "ALTER TYPE \"o_a_status\" RENAME TO \"o_a_state\";",
                "ALTER TYPE \"o_a_state\" ADD VALUE IF NOT EXISTS 'done';",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_removing_enum_choice_fails() {
        let mut c0 = Column::new("status", ColumnType::Enum("o_a_status".to_string()));
        c0.enum_choices = vec!["new".to_string(), "done".to_string()];
        let mut c1 = c0.clone();
        c1.enum_choices = vec!["new".to_string()];

        let err = diff_field("o_a", Some(&shape(c0)), Some(&shape(c1))).unwrap_err();
        assert_eq!(error_code(&err), Some(ErrorCode::InvalidDescription));
    }

    #[test]
    fn test_foreign_key_policy_change() -> Result<()> {
        let ifk = Ifk {
            from_column: "owner".to_string(),
            to_table: "o_user".to_string(),
            to_column: "id".to_string(),
            on_delete: OnDelete::Cascade,
        };
        let mut old = shape(Column::new("owner", ColumnType::Numeric));
        old.ifk = Some(ifk.clone());
        let mut new = old.clone();
        new.ifk = Some(Ifk {
            on_delete: OnDelete::Restrict,
            ..ifk
        });

        let steps = diff_field("o_a", Some(&old), Some(&new))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" DROP CONSTRAINT fk_owner_o_user_id;",
                "ALTER TABLE \"o_a\" ADD CONSTRAINT fk_owner_o_user_id FOREIGN KEY (\"owner\") REFERENCES \"o_user\" (\"id\") ON DELETE RESTRICT;",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_column_count_change_replaces_field() -> Result<()> {
        let old = shape(Column::new("target", ColumnType::Text));
        let new = FieldShape {
            columns: vec![
                Column::new("target__type", ColumnType::Text),
                Column::new("target__key", ColumnType::Text),
            ],
            seq: None,
            ifk: None,
        };

        let steps = diff_field("o_a", Some(&old), Some(&new))?;
        assert_eq!(
            sql(&steps),
            vec![
                "ALTER TABLE \"o_a\" DROP COLUMN \"target\";",
                "ALTER TABLE \"o_a\" ADD COLUMN \"target__type\" text;",
                "ALTER TABLE \"o_a\" ADD COLUMN \"target__key\" text;",
            ]
        );
        Ok(())
    }
}
