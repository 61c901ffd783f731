pub mod apply;
pub mod construct;
pub mod history;
pub mod rollback;

pub use apply::cmd_apply;
pub use construct::{ConstructArgs, cmd_construct};
pub use history::cmd_history;
pub use rollback::{cmd_rollback, cmd_rollback_to};

use crate::catalog::FileCatalogSyncer;
use crate::config::Config;
use crate::db::{PgDatabase, mask_url_password};
use crate::migration::MigrationManager;
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub type Manager = MigrationManager<FileCatalogSyncer, PgDatabase>;

/// Open the configured catalog directory (relative to the config file) and
/// database
pub async fn open_manager(config: &Config, root_dir: &Path) -> Result<Manager> {
    let catalog = FileCatalogSyncer::new(root_dir.join(&config.catalog.directory))?;
    info!(
        "Connecting to {} (catalog in {})",
        mask_url_password(&config.database.url),
        catalog.directory().display()
    );
    let database = PgDatabase::connect(&config.database.url, &config.migration.history_table).await?;
    Ok(MigrationManager::new(catalog, database))
}
