//! Time-to-live cache for fetched series
//!
//! Entries are keyed by symbol and requested range and expire `ttl` after
//! they were stored. Only successful fetches are cached.

use crate::data::Series;
use crate::error::Result;
use crate::source::SeriesSource;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Identity of a cached fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    series: Series,
    stored_at: Instant,
}

/// Series cache with a fixed time-to-live
#[derive(Debug)]
pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SeriesCache {
    /// Create an empty cache; a zero `ttl` never serves a hit
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // The map stays consistent even if a holder panicked
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh copy of a cached series; expired entries are evicted
    pub fn get(&self, key: &CacheKey) -> Option<Series> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() < self.ttl);

        match fresh {
            Some(true) => entries.get(key).map(|entry| entry.series.clone()),
            Some(false) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a series, replacing any previous entry
    pub fn insert(&self, key: CacheKey, series: Series) {
        self.lock().insert(
            key,
            CacheEntry {
                series,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one entry; returns whether it was present
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries and return how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source that consults a `SeriesCache` before delegating
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: SeriesCache,
}

impl<S: SeriesSource> CachedSource<S> {
    pub fn new(inner: S, cache: SeriesCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SeriesSource> SeriesSource for CachedSource<S> {
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        let key = CacheKey::new(symbol, start, end);
        if let Some(series) = self.cache.get(&key) {
            debug!(symbol, %start, %end, "series cache hit");
            return Ok(series);
        }

        debug!(symbol, %start, %end, "series cache miss");
        let series = self.inner.fetch(symbol, start, end)?;
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}
