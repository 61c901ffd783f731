use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use metamig::commands;
use metamig::config;
use metamig::constants::CONFIG_FILENAME;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    database_args: config::DatabaseArgs,

    #[command(flatten)]
    catalog_args: config::CatalogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a migration document
    Apply {
        /// Migration document (JSON)
        file: PathBuf,

        /// Update catalog and history without executing DDL
        #[arg(long)]
        fake: bool,
    },

    /// Roll back the latest migration of an object
    Rollback {
        migration_id: String,

        /// Remove the history record without undoing catalog or DDL changes
        #[arg(long)]
        fake: bool,
    },

    /// Roll back every migration applied after the given one
    RollbackTo {
        migration_id: String,

        /// Remove history records only
        #[arg(long)]
        fake: bool,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Build the migration taking the catalog to a desired object description
    Construct(commands::ConstructArgs),

    /// List applied migrations
    History {
        /// Only migrations of this object
        #[arg(long)]
        object: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);
    tokio::select! {
        result = run_main(cli) => result,
        _ = wait_for_shutdown_signal() => {
            info!("Received shutdown signal, abandoning open transactions");
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_main(cli: Cli) -> Result<()> {
    let (file_config, root_dir) = config::load_config(&cli.config_file)?;
    let cli_config = config::ConfigInput {
        database: Some(cli.database_args.clone().into()),
        catalog: Some(cli.catalog_args.clone().into()),
        migration: None,
    };
    let config = config::ConfigBuilder::new()
        .with_file(file_config)
        .with_cli_args(cli_config)
        .resolve()?;

    match &cli.command {
        Commands::Apply { file, fake } => commands::cmd_apply(&config, &root_dir, file, *fake).await,
        Commands::Rollback { migration_id, fake } => {
            commands::cmd_rollback(&config, &root_dir, migration_id, *fake).await
        }
        Commands::RollbackTo {
            migration_id,
            fake,
            yes,
        } => commands::cmd_rollback_to(&config, &root_dir, migration_id, *fake, *yes).await,
        Commands::Construct(args) => commands::cmd_construct(&config, &root_dir, args).await,
        Commands::History { object } => {
            commands::cmd_history(&config, &root_dir, object.as_deref()).await
        }
    }
}
