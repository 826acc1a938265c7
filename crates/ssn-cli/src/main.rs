mod find_help;
mod reference;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::find_help::FindHelpArgs;

#[derive(Debug, Parser)]
#[command(name = "ssn-cli")]
#[command(about = "Street Support find-help command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for services near a postcode, coordinates or known location
    FindHelp(FindHelpArgs),
    /// List the service category taxonomy
    Categories,
    /// List known locations
    Locations {
        /// Include locations that are not public
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = ssn_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::FindHelp(args)) => find_help::run_find_help(&config, &args).await?,
        Some(Commands::Categories) => reference::run_categories(&config)?,
        Some(Commands::Locations { all }) => reference::run_locations(&config, all)?,
        None => println!("ssn-cli: run with --help to list commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
