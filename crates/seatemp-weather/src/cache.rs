//! In-memory refresh cache in front of the StormGlass client.
//!
//! Holds at most one reading for the whole process. A reading younger than
//! [`STALENESS_WINDOW_SECS`] is served as-is; anything older (or nothing at
//! all) triggers a fetch. Concurrent callers that both see a stale entry may
//! both fetch; the last successful write wins.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::TemperatureError;
use crate::provider::TemperatureSource;
use crate::types::TemperatureReading;

/// 2.4 hours. StormGlass' free tier allows 10 requests a day.
pub const STALENESS_WINDOW_SECS: i64 = 8640;

/// What to do when a refresh of a stale entry fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Return the fetch error to the caller
    #[default]
    Propagate,
    /// Return the previous reading and log the failure
    ServeStale,
}

/// Observable cache state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: TemperatureReading,
    fetched_at: DateTime<Utc>,
}

pub struct RefreshCache {
    source: Arc<dyn TemperatureSource>,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CacheEntry>>,
    max_age: Duration,
    policy: StalePolicy,
}

impl RefreshCache {
    pub fn new(source: Arc<dyn TemperatureSource>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            entry: RwLock::new(None),
            max_age: Duration::seconds(STALENESS_WINDOW_SECS),
            policy: StalePolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stale_policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn state(&self) -> CacheState {
        let now = self.clock.now();
        match self.entry.read().as_ref() {
            None => CacheState::Empty,
            Some(entry) if self.is_fresh(entry, now) => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// When the cached reading was fetched, if there is one
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.read().as_ref().map(|e| e.fetched_at)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.fetched_at < self.max_age
    }

    /// Return the cached reading, refreshing it first when empty or stale.
    pub async fn get(&self) -> Result<TemperatureReading, TemperatureError> {
        let now = self.clock.now();

        let fallback = {
            let guard = self.entry.read();
            match guard.as_ref() {
                Some(entry) if self.is_fresh(entry, now) => {
                    tracing::debug!("Serving cached reading from {}", entry.fetched_at);
                    return Ok(entry.value.clone());
                }
                Some(entry) if self.policy == StalePolicy::ServeStale => {
                    Some((entry.value.clone(), entry.fetched_at))
                }
                _ => None,
            }
        };

        tracing::info!("Refreshing temperature reading");

        match self.source.fetch_window().await {
            Ok(reading) => {
                *self.entry.write() = Some(CacheEntry {
                    value: reading.clone(),
                    fetched_at: now,
                });
                Ok(reading)
            }
            Err(e) => match fallback {
                Some((value, fetched_at)) => {
                    tracing::warn!("Refresh failed, serving reading from {}: {}", fetched_at, e);
                    Ok(value)
                }
                None => {
                    tracing::warn!("Refresh failed: {}", e);
                    Err(e)
                }
            },
        }
    }
}
