use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use javalore::cli::CliApp;
use javalore::cli_types::{Cli, Commands};
use javalore::config::{JavaLoreConfig, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = JavaLoreConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging, cli.verbose);

    let app = CliApp::new(config, cli.verbose, !cli.no_color, cli.json)?;
    match cli.command {
        Commands::Index(args) => app.index(args).await,
        Commands::Search(args) => app.search(args).await,
        Commands::Class(args) => app.class(args).await,
        Commands::Package(args) => app.package(args).await,
        Commands::Analyze(args) => app.analyze(args).await,
        Commands::Config(args) => app.show_config(args),
    }
}

/// `RUST_LOG` wins over the configured level; logs go to stderr so `--json`
/// output stays clean.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}
