//! Cache store and lifecycle
//!
//! Provides the `Cache` handle: a reader/writer locked map from key to
//! timestamped payload, plus ownership of the reaper task that expires it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::reaper;

/// Default time-to-live and reap cadence
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Errors that can occur when constructing a cache
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The interval is zero, which would make the reaper spin
    #[error("Cache interval must be greater than zero")]
    InvalidInterval,

    /// The cache was created outside a Tokio runtime, so the reaper can't run
    #[error("Cache must be created from within a Tokio runtime")]
    NoRuntime,
}

/// A single stored payload
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    /// When the entry was inserted or last overwritten
    pub(crate) created_at: Instant,
    /// The raw response body
    pub(crate) value: Bytes,
}

/// Shared entry map, owned by the store and borrowed by the reaper
pub(crate) type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Configuration for the expiring cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied to every entry, also used as the reap cadence
    pub interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Checks that the configuration can be used to start a cache
    ///
    /// # Returns
    /// * `Ok(())` if the interval is positive
    /// * `Err(CacheError::InvalidInterval)` if the interval is zero
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.interval.is_zero() {
            return Err(CacheError::InvalidInterval);
        }
        Ok(())
    }
}

/// Thread-safe expiring key/value cache
///
/// Payloads are opaque byte sequences. `get` takes the shared lock and `add`
/// takes the exclusive one, as does each reap pass. The reaper starts as soon
/// as the cache is constructed and stops when [`Cache::shutdown`] is called or
/// the cache is dropped, whichever comes first.
///
/// Share a cache between callers by wrapping it in an `Arc`.
#[derive(Debug)]
pub struct Cache {
    entries: Entries,
    interval: Duration,
    /// Dropping this sender closes the channel, which also stops the reaper
    shutdown_tx: Option<mpsc::Sender<()>>,
    reaper: Option<JoinHandle<()>>,
}

impl Cache {
    /// Creates a cache with the given interval and starts its reaper
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Arguments
    /// * `interval` - Entry time-to-live and reap cadence
    ///
    /// # Returns
    /// * `Ok(Cache)` with a running reaper
    /// * `Err(CacheError::InvalidInterval)` if `interval` is zero
    /// * `Err(CacheError::NoRuntime)` if called outside a Tokio runtime
    pub fn new(interval: Duration) -> Result<Self, CacheError> {
        Self::with_config(CacheConfig { interval })
    }

    /// Creates a cache from a `CacheConfig` and starts its reaper
    pub fn with_config(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let reaper = reaper::spawn(&runtime, Arc::clone(&entries), config.interval, shutdown_rx);

        debug!(interval = ?config.interval, "cache started");

        Ok(Self {
            entries,
            interval: config.interval,
            shutdown_tx: Some(shutdown_tx),
            reaper: Some(reaper),
        })
    }

    /// Inserts or overwrites the entry for `key`, stamping it with the current time
    pub fn add(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        trace!(key = %key, bytes = value.len(), "cache add");

        let mut entries = self.entries.write();
        // Stamp under the lock so a concurrent reap pass sees a consistent age
        entries.insert(
            key,
            CacheEntry {
                created_at: Instant::now(),
                value,
            },
        );
    }

    /// Returns the payload stored for `key`, if any
    ///
    /// Freshness is not checked here: an entry can be returned until the next
    /// reap pass removes it.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read();
        let value = entries.get(key).map(|entry| entry.value.clone());
        trace!(key = %key, hit = value.is_some(), "cache get");
        value
    }

    /// Returns the number of stored entries, including ones awaiting reaping
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the configured time-to-live
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the reaper and waits for it to finish
    ///
    /// Entries stay readable through any remaining handles to the map, but no
    /// further reap passes will run.
    pub async fn shutdown(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // A send error means the reaper is already gone
            let _ = shutdown_tx.send(()).await;
        }

        if let Some(reaper) = self.reaper.take() {
            if let Err(e) = reaper.await {
                warn!(error = %e, "cache reaper exited abnormally");
            }
        }

        debug!("cache shut down");
    }
}
