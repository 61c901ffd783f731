use super::open_manager;
use crate::config::Config;
use anyhow::{Result, anyhow};
use console::style;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::Path;

pub async fn cmd_rollback(config: &Config, root_dir: &Path, id: &str, fake: bool) -> Result<()> {
    let manager = open_manager(config, root_dir).await?;
    let record = manager.find(id).await?;
    let parent = manager.rollback(&record.to_description(), fake).await?;

    println!(
        "↩️  Rolled back {} on {}",
        style(id).bold(),
        style(&record.apply_to).cyan()
    );
    match parent {
        Some(parent) => println!("   History of {} now ends at {}", record.apply_to, parent),
        None => println!("   {} has no remaining history", record.apply_to),
    }
    Ok(())
}

pub async fn cmd_rollback_to(
    config: &Config,
    root_dir: &Path,
    id: &str,
    fake: bool,
    yes: bool,
) -> Result<()> {
    let manager = open_manager(config, root_dir).await?;
    let target = manager.find(id).await?;
    let later: Vec<_> = manager
        .history(None)
        .await?
        .into_iter()
        .filter(|r| r.order > target.order)
        .collect();

    if later.is_empty() {
        println!("Nothing was applied after {}", style(id).bold());
        return Ok(());
    }

    println!(
        "\n📋 {}",
        style(format!("Migrations applied after {}", id)).bold().underlined()
    );
    for record in later.iter().rev() {
        println!("   {} {}", style(&record.id).yellow(), record.apply_to);
    }

    if config.migration.confirm_rollback && !yes {
        if !std::io::stdin().is_terminal() {
            return Err(anyhow!(
                "Refusing to roll back {} migrations without confirmation, pass --yes",
                later.len()
            ));
        }
        let proceed = Confirm::new()
            .with_prompt(format!("Roll back {} migrations?", later.len()))
            .default(false)
            .interact()?;
        if !proceed {
            println!("Cancelled");
            return Ok(());
        }
    }

    let rolled_back = manager.rollback_to(id, fake).await?;
    println!(
        "↩️  Rolled back {} migration{}{}",
        rolled_back.len(),
        if rolled_back.len() == 1 { "" } else { "s" },
        if fake { " (history only)" } else { "" }
    );
    Ok(())
}
