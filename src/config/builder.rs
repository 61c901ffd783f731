use crate::config::{merge::Merge, types::*};
use anyhow::Result;

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            database: self.resolve_database(&defaults.database),
            catalog: self.resolve_catalog(&defaults.catalog),
            migration: self.resolve_migration(&defaults.migration),
        })
    }

    fn resolve_database(&self, defaults: &Database) -> Database {
        let url = self
            .config_input
            .database
            .as_ref()
            .and_then(|d| d.url.as_ref())
            .cloned()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| defaults.url.clone());

        Database { url }
    }

    fn resolve_catalog(&self, defaults: &Catalog) -> Catalog {
        Catalog {
            directory: self
                .config_input
                .catalog
                .as_ref()
                .and_then(|c| c.directory.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.directory.clone()),
        }
    }

    fn resolve_migration(&self, defaults: &Migration) -> Migration {
        let mig_input = self.config_input.migration.as_ref();

        let history_table = mig_input
            .and_then(|m| m.history_table.as_ref())
            .map(|t| HistoryTable {
                schema: t
                    .schema
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.history_table.schema.clone()),
                name: t
                    .name
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.history_table.name.clone()),
            })
            .unwrap_or_else(|| defaults.history_table.clone());

        Migration {
            history_table,
            confirm_rollback: mig_input
                .and_then(|m| m.confirm_rollback)
                .unwrap_or(defaults.confirm_rollback),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
