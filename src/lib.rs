//! Pokedex Library
//!
//! This module exposes the expiring cache, the PokeAPI client and the prompt
//! session for use by the binary and integration tests.

pub mod cache;
pub mod catching;
pub mod cli;
pub mod commands;
pub mod data;
pub mod session;
