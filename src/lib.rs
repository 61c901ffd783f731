//! Migration engine for a dynamic object catalog.
//!
//! Object descriptions live in a catalog; each object is backed by a
//! PostgreSQL table. Migrations change a description and its table together,
//! are recorded in a history table, and can be rolled back.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod ddl;
pub mod diff;
pub mod error;
pub mod migration;
pub mod render;

pub use error::{ErrorCode, MigrationError};
