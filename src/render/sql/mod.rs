//! Shared SQL rendering functions
//!
//! Column definitions and foreign key clauses appear both in CREATE TABLE and
//! in ALTER TABLE statements, so they are rendered in one place.

pub mod constraint;
pub mod table;

pub use constraint::render_foreign_key_clause;
pub use table::{render_column_definition, render_column_type, render_create_table};
