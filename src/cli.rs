//! Command-line interface parsing for the Pokedex
//!
//! This module handles parsing of CLI arguments using clap. Every option can
//! also be set through an environment variable, and `StartupConfig` turns the
//! parsed values into validated settings for the cache, client and session.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::data::POKEAPI_BASE_URL;
use crate::session::DEFAULT_PAGE_SIZE;

/// Longest accepted cache TTL, one day
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Largest accepted map page size
pub const MAX_PAGE_SIZE: usize = 1_000;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The cache TTL was zero or longer than a day
    #[error("Invalid cache TTL: must be between 1 and 86400 seconds")]
    InvalidCacheTtl,

    /// The page size was zero or too large
    #[error("Invalid page size: must be between 1 and 1000")]
    InvalidPageSize,
}

/// Pokedex - explore PokeAPI location areas and catch Pokemon
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "An interactive Pokedex backed by PokeAPI")]
#[command(version)]
pub struct Cli {
    /// Seconds an API response stays cached before it may be reaped
    #[arg(long, value_name = "SECONDS", env = "POKEDEX_CACHE_TTL", default_value_t = 5)]
    pub cache_ttl: u64,

    /// Base URL of the PokeAPI v2 endpoint
    #[arg(long, value_name = "URL", env = "POKEDEX_API_URL", default_value = POKEAPI_BASE_URL)]
    pub api_url: String,

    /// Number of location areas shown by `map` and `mapb`
    #[arg(long, value_name = "N", env = "POKEDEX_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Settings for the response cache
    pub cache: CacheConfig,
    /// Base URL for PokeAPI requests
    pub api_url: String,
    /// Location areas per map page
    pub page_size: usize,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            api_url: POKEAPI_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the TTL or page size is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if !(1..=MAX_CACHE_TTL_SECS).contains(&cli.cache_ttl) {
            return Err(CliError::InvalidCacheTtl);
        }
        if !(1..=MAX_PAGE_SIZE).contains(&cli.page_size) {
            return Err(CliError::InvalidPageSize);
        }

        Ok(StartupConfig {
            cache: CacheConfig {
                interval: Duration::from_secs(cli.cache_ttl),
            },
            api_url: cli.api_url.clone(),
            page_size: cli.page_size,
        })
    }
}
