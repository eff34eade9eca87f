//! tokoledger CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tl-cli migrate
//!
//! # List abbreviations used when formatting names
//! tl-cli abbreviations list
//!
//! # Register an abbreviation
//! tl-cli abbreviations add TKI
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `abbreviations list` / `abbreviations add` - Manage the abbreviation set

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "tokoledger CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage abbreviations
    Abbreviations {
        #[command(subcommand)]
        action: AbbreviationAction,
    },
}

#[derive(Subcommand)]
enum AbbreviationAction {
    /// List stored abbreviations
    List,
    /// Register a new abbreviation
    Add {
        /// Abbreviation (stored upper-cased)
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Abbreviations { action } => match action {
            AbbreviationAction::List => commands::abbreviations::list().await?,
            AbbreviationAction::Add { name } => commands::abbreviations::add(&name).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_abbreviation_add() {
        let cli = Cli::try_parse_from(["tl-cli", "abbreviations", "add", "tki"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Abbreviations {
                action: AbbreviationAction::Add { .. }
            })
        ));
    }
}
