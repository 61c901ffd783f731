//! Object catalog: descriptions of the data objects, their fields and actions,
//! and the stores that persist them.

pub mod action;
pub mod field;
pub mod file_syncer;
pub mod object;
pub mod syncer;
pub mod transaction;

pub use action::{Action, Method};
pub use field::{DefaultValue, Field, FieldType, LinkType, OnDelete};
pub use file_syncer::FileCatalogSyncer;
pub use object::{ObjectDescription, link_object_name, reverse_link_name, table_name};
pub use syncer::{CatalogSyncer, InMemoryCatalogSyncer};
pub use transaction::{CatalogTransaction, TransactionState};
