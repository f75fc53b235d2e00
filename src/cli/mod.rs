pub mod history;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::App;

/// Package Migrator - apply migration packages and keep a local run history
#[derive(Parser, Debug)]
#[command(
    name = "pkgmig",
    version,
    about = "Package Migrator - apply migration packages and keep a local run history"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory path (holds builds/)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a migration against a target environment
    Run {
        /// Target environment name (see `pkgmig environments`)
        #[arg(short = 'e', long)]
        environment: String,

        /// "Create Undo Package" or "Refresh Schema"
        #[arg(short = 'a', long, default_value = "Create Undo Package")]
        action: String,

        /// Project name (defaults to the configured default project)
        #[arg(short = 'p', long)]
        project: Option<String>,

        /// Path of the migration package file
        #[arg(short = 'k', long)]
        package: Option<String>,

        /// Stream run events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List recent migrations, newest first
    History {
        /// Number of runs to show (defaults to history_limit from config)
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the full console log of one migration
    Show {
        /// Run number
        run_number: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured target environments
    Environments,

    /// Delete all but the newest run records
    Prune {
        /// Number of newest records to keep
        #[arg(long)]
        keep: usize,
    },
}

/// Dispatch the CLI command to the appropriate handler.
pub async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        // No subcommand provided -- print help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let app = App::open(cli.config.as_deref(), cli.data_dir.as_deref()).await?;

    match command {
        Commands::Run {
            environment,
            action,
            project,
            package,
            json,
        } => {
            run::cmd_run(
                &app,
                environment,
                action,
                project.as_deref(),
                package.as_deref(),
                *json,
            )
            .await
        }
        Commands::History { limit, json } => {
            history::cmd_history(&app, limit.map(|n| n as usize), *json).await
        }
        Commands::Show { run_number, json } => history::cmd_show(&app, *run_number, *json).await,
        Commands::Environments => history::cmd_environments(&app),
        Commands::Prune { keep } => history::cmd_prune(&app, *keep).await,
    }
}
