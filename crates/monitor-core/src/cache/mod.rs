//! Generation-stamped cache of monitoring data.
//!
//! Every write carries the generation its fetch was dispatched with. A value
//! write is applied only when its generation is newer than the stored one, so
//! a slow fetch can never overwrite the result of a fetch dispatched after
//! it. Errors are ordered separately and never erase the last good value.
//!
//! The cache has a single writer (the refresh scheduler holds it by value
//! and mutates it through `&mut self`); readers borrow it immutably.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::fetch::FetchError;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Last successfully fetched value; survives later failures.
    pub value: Option<T>,
    /// Generation of `value`. Zero until the first accepted success.
    pub generation: u64,
    pub fetched_at: Option<Instant>,
    pub last_error: Option<FetchError>,
    /// Generation of `last_error`, ordered independently of `generation`.
    pub error_generation: u64,
    pub errored_at: Option<Instant>,
    pub consecutive_failures: u32,
}

impl<T> CacheEntry<T> {
    fn empty() -> Self {
        Self {
            value: None,
            generation: 0,
            fetched_at: None,
            last_error: None,
            error_generation: 0,
            errored_at: None,
            consecutive_failures: 0,
        }
    }

    pub fn age_at(&self, now: Instant) -> Option<Duration> {
        self.fetched_at
            .map(|fetched_at| now.saturating_duration_since(fetched_at))
    }
}

#[derive(Debug)]
pub struct DataCache<T = Value> {
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T> Default for DataCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> DataCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a successful result. Returns false when the write is stale.
    ///
    /// An accepted write always resets the failure streak. It clears the
    /// recorded error only when it is newer than that error.
    pub fn set(&mut self, key: &str, value: T, generation: u64) -> bool {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(CacheEntry::empty);

        if generation <= entry.generation {
            debug!(
                event = "core.cache.stale_write_discarded",
                key = key,
                generation = generation,
                stored_generation = entry.generation
            );
            return false;
        }

        entry.value = Some(value);
        entry.generation = generation;
        entry.fetched_at = Some(Instant::now());
        entry.consecutive_failures = 0;

        if generation > entry.error_generation {
            entry.last_error = None;
        }
        true
    }

    /// Record a failed fetch. Returns false when the error slot already holds
    /// a newer error; the failure streak grows either way.
    pub fn set_error(&mut self, key: &str, generation: u64, error: FetchError) -> bool {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(CacheEntry::empty);

        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);

        if generation <= entry.error_generation {
            debug!(
                event = "core.cache.stale_error_discarded",
                key = key,
                generation = generation,
                stored_generation = entry.error_generation
            );
            return false;
        }

        entry.last_error = Some(error);
        entry.error_generation = generation;
        entry.errored_at = Some(Instant::now());
        true
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|entry| entry.value.as_ref())
    }

    /// Time since the last accepted successful write.
    pub fn age(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .and_then(|entry| entry.age_at(Instant::now()))
    }

    pub fn error(&self, key: &str) -> Option<&FetchError> {
        self.entries
            .get(key)
            .and_then(|entry| entry.last_error.as_ref())
    }

    pub fn failure_count(&self, key: &str) -> u32 {
        self.entries
            .get(key)
            .map_or(0, |entry| entry.consecutive_failures)
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Used on teardown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boom() -> FetchError {
        FetchError::adapter("connection refused")
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = DataCache::new();
        assert!(cache.set("docker:prod", json!({"up": 3}), 1));
        assert_eq!(cache.get("docker:prod"), Some(&json!({"up": 3})));
        assert_eq!(cache.entry("docker:prod").unwrap().generation, 1);
    }

    #[test]
    fn test_older_generation_is_discarded() {
        let mut cache = DataCache::new();
        assert!(cache.set("k", json!("v3"), 3));
        assert!(!cache.set("k", json!("v2"), 2));
        assert!(!cache.set("k", json!("v3-again"), 3));
        assert_eq!(cache.get("k"), Some(&json!("v3")));
    }

    #[test]
    fn test_error_keeps_last_good_value() {
        let mut cache = DataCache::new();
        cache.set("k", json!("good"), 1);
        assert!(cache.set_error("k", 2, boom()));
        assert_eq!(cache.get("k"), Some(&json!("good")));
        assert_eq!(cache.error("k"), Some(&boom()));
        assert_eq!(cache.failure_count("k"), 1);
    }

    #[test]
    fn test_error_creates_entry_without_value() {
        let mut cache: DataCache = DataCache::new();
        cache.set_error("k", 1, boom());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert!(cache.age("k").is_none());
    }

    #[test]
    fn test_failures_count_even_when_error_slot_is_stale() {
        let mut cache: DataCache = DataCache::new();
        assert!(cache.set_error("k", 5, boom()));
        assert!(!cache.set_error("k", 4, FetchError::Timeout { after_ms: 10 }));
        assert_eq!(cache.failure_count("k"), 2);
        assert_eq!(cache.error("k"), Some(&boom()));
    }

    #[test]
    fn test_newer_success_clears_error_and_streak() {
        let mut cache = DataCache::new();
        cache.set_error("k", 1, boom());
        cache.set_error("k", 2, boom());
        assert!(cache.set("k", json!("ok"), 3));
        assert!(cache.error("k").is_none());
        assert_eq!(cache.failure_count("k"), 0);
    }

    #[test]
    fn test_older_success_keeps_newer_error_but_resets_streak() {
        let mut cache = DataCache::new();
        cache.set("k", json!("v1"), 1);
        cache.set_error("k", 3, boom());
        // gen 2 completes late: its value is newer than v1, the error is newer still
        assert!(cache.set("k", json!("v2"), 2));
        assert_eq!(cache.get("k"), Some(&json!("v2")));
        assert_eq!(cache.error("k"), Some(&boom()));
        assert_eq!(cache.failure_count("k"), 0);
    }

    #[test]
    fn test_rejected_success_keeps_streak() {
        let mut cache = DataCache::new();
        cache.set("k", json!("v2"), 2);
        cache.set_error("k", 3, boom());
        assert!(!cache.set("k", json!("v1"), 1));
        assert_eq!(cache.failure_count("k"), 1);
    }

    #[test]
    fn test_unknown_key() {
        let cache: DataCache = DataCache::new();
        assert!(cache.get("nope").is_none());
        assert!(cache.error("nope").is_none());
        assert_eq!(cache.failure_count("nope"), 0);
        assert!(cache.age("nope").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_age_tracks_clock() {
        let mut cache = DataCache::new();
        cache.set("k", json!(1), 1);
        assert!(cache.age("k").unwrap() < Duration::from_millis(50));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(cache.age("k").unwrap(), Duration::from_secs(20));

        // A failure does not refresh the age
        cache.set_error("k", 2, boom());
        assert_eq!(cache.age("k").unwrap(), Duration::from_secs(20));
    }

    #[test]
    fn test_clear() {
        let mut cache = DataCache::new();
        cache.set("a", json!(1), 1);
        cache.set("b", json!(2), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
