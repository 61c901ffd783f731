//! Hierarchical DDL steps.
//!
//! Each physical object kind has its own operation enum; [`DdlStep`] ties
//! them together and [`SqlRenderer`] turns any of them into statements.

use crate::render::RenderedSql;

pub use constraint::*;
pub use enum_type::*;
pub use sequence::*;
pub use table::*;

pub mod constraint;
pub mod enum_type;
pub mod sequence;
pub mod table;

/// One DDL step - hierarchical structure per physical object kind
#[derive(Debug, Clone, PartialEq)]
pub enum DdlStep {
    Table(TableOperation),
    Sequence(SequenceOperation),
    Constraint(ConstraintOperation),
    EnumType(EnumTypeOperation),
}

/// Trait for rendering SQL from operations
pub trait SqlRenderer {
    fn to_sql(&self) -> Vec<RenderedSql>;
    /// Physical object the step acts on, for error reporting
    fn object_name(&self) -> String;
    fn is_destructive(&self) -> bool {
        false
    }
}

impl SqlRenderer for DdlStep {
    fn to_sql(&self) -> Vec<RenderedSql> {
        match self {
            DdlStep::Table(op) => op.to_sql(),
            DdlStep::Sequence(op) => op.to_sql(),
            DdlStep::Constraint(op) => op.to_sql(),
            DdlStep::EnumType(op) => op.to_sql(),
        }
    }

    fn object_name(&self) -> String {
        match self {
            DdlStep::Table(op) => op.object_name(),
            DdlStep::Sequence(op) => op.object_name(),
            DdlStep::Constraint(op) => op.object_name(),
            DdlStep::EnumType(op) => op.object_name(),
        }
    }

    fn is_destructive(&self) -> bool {
        match self {
            DdlStep::Table(op) => op.is_destructive(),
            DdlStep::Sequence(op) => op.is_destructive(),
            DdlStep::Constraint(op) => op.is_destructive(),
            DdlStep::EnumType(op) => op.is_destructive(),
        }
    }
}

impl DdlStep {
    /// Single-action ALTER TABLE step
    pub fn alter(table: &str, action: ColumnAction) -> Self {
        DdlStep::Table(TableOperation::Alter {
            name: table.to_string(),
            actions: vec![action],
        })
    }
}

/// Render a list of steps into statements, in order
pub fn render_steps(steps: &[DdlStep]) -> Vec<RenderedSql> {
    steps.iter().flat_map(|step| step.to_sql()).collect()
}
