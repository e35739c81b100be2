//! Core data models for the Pokedex
//!
//! This module contains the records decoded from PokeAPI responses. Only the
//! fields the session displays are modelled; anything else in the JSON is
//! ignored.

pub mod pokeapi;

pub use pokeapi::{PokeApiClient, PokeApiError, POKEAPI_BASE_URL};

use serde::{Deserialize, Serialize};

/// A name plus the API URL it resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    /// Resource name, e.g. "canalave-city-area"
    pub name: String,
    /// Full API URL of the resource
    #[serde(default)]
    pub url: String,
}

/// One page of the location area listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAreaPage {
    /// Total number of location areas
    pub count: u32,
    /// URL of the next page, if any
    pub next: Option<String>,
    /// URL of the previous page, if any
    pub previous: Option<String>,
    /// The location areas on this page
    pub results: Vec<NamedResource>,
}

/// A location area and the Pokemon that can be encountered there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationArea {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub game_index: u32,
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

/// A Pokemon that appears in a location area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

/// Details for a single Pokemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Experience gained for defeating it; PokeAPI reports `null` for some forms
    #[serde(default)]
    pub base_experience: Option<u32>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

/// A base stat value, e.g. hp or speed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

/// One of a Pokemon's types, ordered by slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}
