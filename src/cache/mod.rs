//! In-memory expiring cache for raw API responses
//!
//! This module provides a [`Cache`] that keeps response bodies keyed by request
//! URL so repeated lookups during a session don't hit PokeAPI again. Entries are
//! reclaimed by a background reaper task once they are older than the configured
//! interval; lookups themselves never check freshness.

mod reaper;
mod store;

pub use store::{Cache, CacheConfig, CacheError, DEFAULT_INTERVAL};
