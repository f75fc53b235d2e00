use clap::Parser;
use tracing_subscriber::EnvFilter;

use package_migrator::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Run log lines are already printed to the console; keep them out of stderr
    // unless asked for.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,run_log=off"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::dispatch(&cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
