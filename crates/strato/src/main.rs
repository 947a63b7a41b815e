//! Strato - control server for cloud data platform operations

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

mod server;

/// Strato control server
#[derive(Parser)]
#[command(name = "strato")]
#[command(about = "Cloud data platform operations as schema-described tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the config file (default: ~/.strato/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Instance to target instead of the configured active one
    #[arg(short, long, global = true)]
    instance: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tool calls over stdio, one JSON request per line
    Serve {
        /// Debug logging plus error-cause echo in envelopes
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the tool listing as JSON
    Tools,
    /// Probe backend connectivity and print the report
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Serve { verbose: true });
    init_tracing(verbose);

    let settings = match load_settings(&cli, verbose).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { .. } => server::serve(settings).await,
        Commands::Tools => server::print_tools(settings),
        Commands::Check => server::check(settings).await,
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Envelopes own stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_settings(
    cli: &Cli,
    verbose: bool,
) -> anyhow::Result<std::sync::Arc<strato_config::Settings>> {
    let instance = cli.instance.as_deref();
    let mut settings = match &cli.config {
        Some(path) => strato_config::Settings::load_from(path, instance).await?,
        None => strato_config::Settings::load(instance).await?,
    };
    if verbose {
        settings.logging.level = "debug".to_string();
    }
    Ok(std::sync::Arc::new(settings))
}
