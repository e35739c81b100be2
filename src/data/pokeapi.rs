//! PokeAPI client
//!
//! This module fetches location areas and Pokemon from PokeAPI and decodes them
//! into our data structures. Every response body passes through the shared
//! expiring [`Cache`], keyed by the full request URL, so paging back and forth
//! or re-inspecting a Pokemon doesn't repeat the network call.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{LocationArea, LocationAreaPage, NamedResource, Pokemon};
use crate::cache::Cache;

/// Base URL for PokeAPI v2
pub const POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Errors that can occur when fetching from PokeAPI
#[derive(Debug, Error)]
pub enum PokeApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A named resource does not exist upstream
    #[error("{kind} `{name}` not found.")]
    NotFound { kind: &'static str, name: String },

    /// Any other non-success status
    #[error("Response failed with status code: `{status}` and body `{body}`")]
    UnexpectedStatus { status: u16, body: String },
}

/// Client for fetching Pokedex data from PokeAPI
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Response cache shared with the rest of the session
    cache: Arc<Cache>,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl PokeApiClient {
    /// Creates a new PokeApiClient pointing at the public PokeAPI
    pub fn new(cache: Arc<Cache>) -> Self {
        Self::with_base_url(cache, POKEAPI_BASE_URL)
    }

    /// Creates a new PokeApiClient with a custom base URL
    ///
    /// A trailing slash on `base_url` is ignored.
    pub fn with_base_url(cache: Arc<Cache>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            http_client: Client::new(),
            cache,
            base_url,
        }
    }

    /// Returns the cache this client reads through
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Fetches one page of location area names
    ///
    /// # Arguments
    /// * `offset` - Index of the first location area on the page
    /// * `limit` - Number of location areas per page
    ///
    /// # Returns
    /// * `Ok(Vec<NamedResource>)` - The location areas on the page
    /// * `Err(PokeApiError)` - If the request or parsing fails
    pub async fn fetch_location_areas(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<NamedResource>, PokeApiError> {
        let url = format!(
            "{}/location-area/?offset={}&limit={}",
            self.base_url, offset, limit
        );

        let page: LocationAreaPage = self.get_json(&url).await?;
        Ok(page.results)
    }

    /// Fetches a single location area with its Pokemon encounters
    ///
    /// # Returns
    /// * `Ok(LocationArea)` - The location area
    /// * `Err(PokeApiError::NotFound)` - If PokeAPI has no such area
    /// * `Err(PokeApiError)` - If the request or parsing fails
    pub async fn fetch_location_area(&self, name: &str) -> Result<LocationArea, PokeApiError> {
        let url = format!("{}/location-area/{}", self.base_url, name);
        self.get_json(&url)
            .await
            .map_err(|e| not_found_as(e, "Location", name))
    }

    /// Fetches details for a single Pokemon
    ///
    /// # Returns
    /// * `Ok(Pokemon)` - The Pokemon's details
    /// * `Err(PokeApiError::NotFound)` - If PokeAPI has no such Pokemon
    /// * `Err(PokeApiError)` - If the request or parsing fails
    pub async fn fetch_pokemon(&self, name: &str) -> Result<Pokemon, PokeApiError> {
        let url = format!("{}/pokemon/{}", self.base_url, name);
        self.get_json(&url)
            .await
            .map_err(|e| not_found_as(e, "Pokemon", name))
    }

    /// Loads the body for `url` and decodes it
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PokeApiError> {
        let body = self.load_or_fetch(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns the cached body for `url`, fetching and caching it on a miss
    ///
    /// Only successful responses are cached.
    async fn load_or_fetch(&self, url: &str) -> Result<Bytes, PokeApiError> {
        if let Some(body) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(body);
        }

        debug!(url, "cache miss, fetching");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            debug!(url, status = status.as_u16(), "request failed");
            return Err(PokeApiError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        self.cache.add(url, body.clone());
        Ok(body)
    }
}

/// Turns a 404 for a named resource into `PokeApiError::NotFound`
fn not_found_as(error: PokeApiError, kind: &'static str, name: &str) -> PokeApiError {
    match error {
        PokeApiError::UnexpectedStatus { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            PokeApiError::NotFound {
                kind,
                name: name.to_string(),
            }
        }
        other => other,
    }
}
