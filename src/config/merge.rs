use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            database: match (self.database, other.database) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            catalog: match (self.catalog, other.catalog) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            migration: match (self.migration, other.migration) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
        }
    }
}

impl DatabaseInput {
    pub fn merge_with(self, other: DatabaseInput) -> DatabaseInput {
        DatabaseInput {
            url: self.url.merge(other.url),
        }
    }
}

impl CatalogInput {
    pub fn merge_with(self, other: CatalogInput) -> CatalogInput {
        CatalogInput {
            directory: self.directory.merge(other.directory),
        }
    }
}

impl MigrationInput {
    pub fn merge_with(self, other: MigrationInput) -> MigrationInput {
        MigrationInput {
            history_table: match (self.history_table, other.history_table) {
                (Some(a), Some(b)) => Some(HistoryTableInput {
                    schema: a.schema.merge(b.schema),
                    name: a.name.merge(b.name),
                }),
                (a, b) => b.or(a),
            },
            confirm_rollback: self.confirm_rollback.merge(other.confirm_rollback),
        }
    }
}
