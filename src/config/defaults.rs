use crate::config::types::*;

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/metamig".to_string(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            directory: "catalog".to_string(),
        }
    }
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            history_table: HistoryTable::default(),
            confirm_rollback: true,
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            name: "metamig_history".to_string(),
        }
    }
}
