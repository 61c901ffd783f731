use super::{create_enum_steps, drop_enum_steps};
use crate::ddl::{TableShape, unique_constraint_name};
use crate::diff::operations::{
    ConstraintOperation, DdlStep, EnumTypeOperation, SequenceOperation, TableOperation,
};

/// Whole-table steps for object creation, deletion and rename
pub fn diff_table(old: Option<&TableShape>, new: Option<&TableShape>) -> Vec<DdlStep> {
    match (old, new) {
        (None, None) => Vec::new(),

        (None, Some(n)) => {
            let mut steps = create_enum_steps(n.columns());
            steps.extend(n.seqs().map(|seq| {
                DdlStep::Sequence(SequenceOperation::Create {
                    name: seq.name.clone(),
                })
            }));
            steps.push(DdlStep::Table(TableOperation::Create {
                name: n.table.clone(),
                columns: n.columns().cloned().collect(),
                foreign_keys: n.ifks().cloned().collect(),
                primary_key: n.primary_key.clone(),
            }));
            steps
        }

        (Some(o), None) => {
            let mut steps = vec![DdlStep::Table(TableOperation::Drop {
                name: o.table.clone(),
            })];
            steps.extend(o.seqs().map(|seq| {
                DdlStep::Sequence(SequenceOperation::Drop {
                    name: seq.name.clone(),
                })
            }));
            steps.extend(drop_enum_steps(o.columns()));
            steps
        }

        (Some(o), Some(n)) => {
            if o.table == n.table {
                return Vec::new();
            }

            let mut steps = vec![DdlStep::Table(TableOperation::Rename {
                name: o.table.clone(),
                new_name: n.table.clone(),
            })];

            for (f0, f1) in o.fields.iter().zip(n.fields.iter()) {
                if let (Some(s0), Some(s1)) = (&f0.seq, &f1.seq)
                    && s0.name != s1.name
                {
                    steps.push(DdlStep::Sequence(SequenceOperation::Rename {
                        name: s0.name.clone(),
                        new_name: s1.name.clone(),
                    }));
                }

                // Self links point at the renamed table
                if let (Some(k0), Some(k1)) = (&f0.ifk, &f1.ifk)
                    && k0.constraint_name() != k1.constraint_name()
                {
                    steps.push(DdlStep::Constraint(ConstraintOperation::RenameForeignKey {
                        table: n.table.clone(),
                        name: k0.constraint_name(),
                        new_name: k1.constraint_name(),
                    }));
                }

                for (c0, c1) in f0.columns.iter().zip(f1.columns.iter()) {
                    if let (Some(e0), Some(e1)) =
                        (c0.column_type.enum_name(), c1.column_type.enum_name())
                        && e0 != e1
                    {
                        steps.push(DdlStep::EnumType(EnumTypeOperation::Rename {
                            name: e0.to_string(),
                            new_name: e1.to_string(),
                        }));
                    }

                    // Implicit unique constraint names embed the table name
                    if c0.unique && c1.unique {
                        steps.push(DdlStep::Constraint(ConstraintOperation::RenameUnique {
                            table: n.table.clone(),
                            name: unique_constraint_name(&o.table, &c0.name),
                            new_name: unique_constraint_name(&n.table, &c1.name),
                        }));
                    }
                }
            }

            steps
        }
    }
}
