use super::open_manager;
use crate::config::Config;
use crate::migration::MigrationObjectDescription;
use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct ConstructArgs {
    /// JSON description of the desired object
    #[arg(required_unless_present = "delete", conflicts_with = "delete")]
    pub desired: Option<PathBuf>,

    /// Stored object to diff against, when it differs from the desired name
    #[arg(long)]
    pub object: Option<String>,

    /// Construct the migration deleting this object
    #[arg(long)]
    pub delete: Option<String>,

    /// Write the migration document here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub async fn cmd_construct(config: &Config, root_dir: &Path, args: &ConstructArgs) -> Result<()> {
    let desired = args
        .desired
        .as_deref()
        .map(MigrationObjectDescription::from_file)
        .transpose()?;

    let object = args.delete.as_deref().or(args.object.as_deref());
    if desired.is_none() && object.is_none() {
        return Err(anyhow!("Nothing to construct: pass a desired description or --delete"));
    }

    let manager = open_manager(config, root_dir).await?;
    let migration = manager.construct(object, desired.as_ref()).await?;
    let json = migration.to_json()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write migration to {}", path.display()))?;
            println!(
                "📝 Wrote migration {} ({} operations) to {}",
                migration.id,
                migration.operations.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
