//! Pokedex - an interactive prompt for exploring PokeAPI
//!
//! Reads commands from stdin, fetches location areas and Pokemon through an
//! expiring in-memory cache, and keeps track of the Pokemon caught so far.

use std::io;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pokedex::cache::Cache;
use pokedex::cli::{Cli, StartupConfig};
use pokedex::data::PokeApiClient;
use pokedex::session::Session;

/// Sets up logging to stderr so it doesn't interleave with the prompt.
///
/// Defaults to warnings only; use `RUST_LOG` to see cache activity, e.g.
/// `RUST_LOG=pokedex=debug`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let cache = Arc::new(Cache::with_config(config.cache)?);
    let client = PokeApiClient::with_base_url(Arc::clone(&cache), config.api_url.as_str());
    let mut session = Session::new(client, config.page_size);

    info!(
        ttl = ?config.cache.interval,
        api_url = %config.api_url,
        "pokedex started"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    session.run(stdin, &mut stdout).await?;

    // The session holds the other reference to the cache
    drop(session);
    match Arc::try_unwrap(cache) {
        Ok(cache) => cache.shutdown().await,
        Err(_) => warn!("cache still shared at exit, reaper will stop on drop"),
    }

    Ok(())
}
