use super::open_manager;
use crate::config::Config;
use anyhow::Result;
use console::style;
use itertools::Itertools;
use std::path::Path;

pub async fn cmd_history(config: &Config, root_dir: &Path, object: Option<&str>) -> Result<()> {
    let manager = open_manager(config, root_dir).await?;
    let records = manager.history(object).await?;

    if records.is_empty() {
        println!("No migrations have been applied");
        return Ok(());
    }

    println!("Applied migrations:");
    for record in records {
        println!(
            "  {} {} [{}] (applied: {})",
            style(&record.id).bold(),
            style(&record.apply_to).cyan(),
            record.operations.iter().map(|op| op.kind()).join(", "),
            record.applied_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
