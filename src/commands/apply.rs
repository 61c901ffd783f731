use super::open_manager;
use crate::config::Config;
use crate::migration::MigrationDescription;
use anyhow::Result;
use console::style;
use std::path::Path;

pub async fn cmd_apply(config: &Config, root_dir: &Path, file: &Path, fake: bool) -> Result<()> {
    let description = MigrationDescription::from_file(file)?;
    let object = description.object_name()?;

    let manager = open_manager(config, root_dir).await?;
    let applied = manager.apply(description, fake).await?;

    println!(
        "✅ Applied migration {} to {}{}",
        style(&applied.id).bold(),
        style(object).cyan(),
        if fake {
            style(" (fake, no DDL executed)").dim().to_string()
        } else {
            String::new()
        }
    );
    Ok(())
}
