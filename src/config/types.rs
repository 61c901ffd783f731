use clap::Args;
use serde::{Deserialize, Serialize};

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub database: Option<DatabaseInput>,
    pub catalog: Option<CatalogInput>,
    pub migration: Option<MigrationInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database: Database,
    pub catalog: Catalog,
    pub migration: Migration,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInput {
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogInput {
    pub directory: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Directory holding one JSON description per object
    pub directory: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MigrationInput {
    pub history_table: Option<HistoryTableInput>,
    pub confirm_rollback: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryTableInput {
    pub schema: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Migration {
    pub history_table: HistoryTable,
    /// Ask before `rollback-to` removes migrations
    pub confirm_rollback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTable {
    pub schema: String,
    pub name: String,
}

// CLI argument groups
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    #[arg(long, global = true, help = "Database URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    #[arg(long, global = true, help = "Catalog directory path")]
    pub catalog_dir: Option<String>,
}

impl From<DatabaseArgs> for DatabaseInput {
    fn from(args: DatabaseArgs) -> Self {
        Self {
            url: args.database_url,
        }
    }
}

impl From<CatalogArgs> for CatalogInput {
    fn from(args: CatalogArgs) -> Self {
        Self {
            directory: args.catalog_dir,
        }
    }
}
