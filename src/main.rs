//! Quote Sync - command line controller
//!
//! Drives the local quote store and its server sync from the terminal.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = cli::load_config(&cli)?;

    match &cli.command {
        Commands::Show { category } => {
            cli::show_quote(&config, category.clone()).await?;
        }
        Commands::List { category, json } => {
            cli::list_quotes(&config, category.clone(), *json).await?;
        }
        Commands::Categories => {
            cli::list_categories(&config).await?;
        }
        Commands::Filter { category } => {
            cli::set_filter(&config, category).await?;
        }
        Commands::Add { text, category } => {
            cli::add_quote(&config, text, category).await?;
        }
        Commands::Import { file } => {
            cli::import_quotes(&config, file).await?;
        }
        Commands::Export { output } => {
            cli::export_quotes(&config, output).await?;
        }
        Commands::Sync => {
            cli::sync_once(&config).await?;
        }
        Commands::Watch => {
            cli::watch(&config).await?;
        }
        Commands::Shell => {
            cli::shell(&config).await?;
        }
        Commands::Config { init } => {
            cli::show_config(&cli, &config, *init).await?;
        }
    }

    Ok(())
}
