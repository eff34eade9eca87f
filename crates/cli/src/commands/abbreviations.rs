//! Abbreviation management commands.
//!
//! # Usage
//!
//! ```bash
//! # List stored abbreviations
//! tl-cli abbreviations list
//!
//! # Register an abbreviation (stored upper-cased)
//! tl-cli abbreviations add pt
//! ```

use std::sync::Arc;

use tokoledger_server::db::{self, AbbreviationRepository, PgRepository};
use tokoledger_server::services::AbbreviationRegistry;

use super::{CommandError, database_url};

async fn connect() -> Result<Arc<PgRepository>, CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    Ok(Arc::new(PgRepository::new(pool)))
}

/// Print every stored abbreviation, one per line.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CommandError> {
    let repo = connect().await?;
    for name in repo.list_abbreviations().await? {
        println!("{name}");
    }
    Ok(())
}

/// Register an abbreviation with the same rules as `POST /abbreviations`.
///
/// # Errors
///
/// Returns an error if the name is blank or the database cannot be reached.
pub async fn add(raw: &str) -> Result<(), CommandError> {
    let repo = connect().await?;
    let registry = AbbreviationRegistry::new(repo);
    let (name, created) = registry.add(raw).await?;

    if created {
        tracing::info!("Registered abbreviation {name}");
    } else {
        tracing::info!("Abbreviation {name} already registered");
    }
    Ok(())
}
