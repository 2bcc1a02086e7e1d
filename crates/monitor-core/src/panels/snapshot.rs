use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::cache::DataCache;
use crate::config::DashboardConfig;
use crate::fetch::FetchError;

/// When cached data stops counting as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusThresholds {
    /// Data at least `staleness_multiplier × interval` old is stale.
    pub staleness_multiplier: u32,
    /// Consecutive failures at which a resource is shown as offline.
    pub offline_after_failures: u32,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl StatusThresholds {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            staleness_multiplier: config.staleness_multiplier(),
            offline_after_failures: config.offline_after_failures(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Nothing fetched yet.
    Loading,
    Fresh,
    Stale,
    /// The latest fetch failed; last good value (if any) is still shown.
    Failing,
    Offline,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Loading => "loading",
            ResourceStatus::Fresh => "fresh",
            ResourceStatus::Stale => "stale",
            ResourceStatus::Failing => "failing",
            ResourceStatus::Offline => "offline",
        }
    }
}

/// Everything a panel needs to know about one resource key.
#[derive(Debug, Clone)]
pub struct ResourceView<'a> {
    pub key: &'a str,
    pub status: ResourceStatus,
    pub value: Option<&'a Value>,
    pub age: Option<Duration>,
    pub error: Option<&'a FetchError>,
    pub failures: u32,
}

/// Read-only view of the cache at one instant.
///
/// Built by the host for every render, so panels never see the cache change
/// underneath them and never touch the scheduler.
pub struct CacheSnapshot<'a> {
    cache: &'a DataCache,
    now: Instant,
    thresholds: StatusThresholds,
    intervals: Option<&'a HashMap<String, Duration>>,
}

impl<'a> CacheSnapshot<'a> {
    pub fn new(cache: &'a DataCache, now: Instant, thresholds: StatusThresholds) -> Self {
        Self {
            cache,
            now,
            thresholds,
            intervals: None,
        }
    }

    /// Per-key refresh intervals, preferred over a panel's own interval when
    /// judging staleness.
    pub fn with_intervals(mut self, intervals: &'a HashMap<String, Duration>) -> Self {
        self.intervals = Some(intervals);
        self
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn thresholds(&self) -> StatusThresholds {
        self.thresholds
    }

    pub fn view(&self, key: &'a str, fallback_interval: Duration) -> ResourceView<'a> {
        let interval = self
            .intervals
            .and_then(|intervals| intervals.get(key).copied())
            .unwrap_or(fallback_interval);

        let Some(entry) = self.cache.entry(key) else {
            return ResourceView {
                key,
                status: ResourceStatus::Loading,
                value: None,
                age: None,
                error: None,
                failures: 0,
            };
        };

        let age = entry.age_at(self.now);
        let stale_after = interval * self.thresholds.staleness_multiplier;
        let status = if entry.consecutive_failures >= self.thresholds.offline_after_failures {
            ResourceStatus::Offline
        } else if entry.last_error.is_some() {
            ResourceStatus::Failing
        } else if entry.value.is_none() {
            ResourceStatus::Loading
        } else if age.is_some_and(|age| age >= stale_after) {
            ResourceStatus::Stale
        } else {
            ResourceStatus::Fresh
        };

        ResourceView {
            key,
            status,
            value: entry.value.as_ref(),
            age,
            error: entry.last_error.as_ref(),
            failures: entry.consecutive_failures,
        }
    }
}
