//! Background refresh scheduler.
//!
//! Owns one timer per resource key and the [`DataCache`] those timers feed.
//! Fetches run as spawned tasks; their outcomes come back over a channel and
//! are applied by whoever owns the scheduler (the dashboard event loop), so
//! the cache keeps a single writer and needs no lock.
//!
//! Timers are fixed-rate: the next tick is due one interval after the
//! previous tick was due, not after the previous fetch finished. A tick that
//! finds the key's previous fetch still running is skipped.

pub mod types;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::DataCache;
use crate::fetch::{FetchError, ResourceFetcher};

pub use types::{FetchOutcome, RefreshRequest, SchedulerStats, TickResult};

struct RefreshTask<T> {
    interval: Duration,
    timeout: Duration,
    next_fire: Instant,
    fetcher: Arc<dyn ResourceFetcher<T>>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    manual: bool,
}

pub struct RefreshScheduler<T = Value> {
    cache: DataCache<T>,
    tasks: HashMap<String, RefreshTask<T>>,
    in_flight: HashMap<String, InFlight>,
    /// Last dispatched generation per key. Outlives `cancel` so a
    /// re-scheduled key keeps counting upwards.
    generations: HashMap<String, u64>,
    /// Highest generation dispatched before the key was last cancelled.
    /// Outcomes at or below it are discarded even if the key is re-scheduled.
    cancelled_through: HashMap<String, u64>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome<T>>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome<T>>,
    stats: SchedulerStats,
    shut_down: bool,
}

/// First deadline after `now` on the fixed-rate grid that starts at
/// `previous`. Deadlines missed in between are skipped.
fn next_fire_after(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let missed = now.saturating_duration_since(previous).as_nanos() / interval.as_nanos().max(1);
    u32::try_from(missed + 1)
        .ok()
        .and_then(|steps| interval.checked_mul(steps))
        .and_then(|step| previous.checked_add(step))
        .or_else(|| now.checked_add(interval))
        .unwrap_or(now)
}

impl<T: Send + 'static> Default for RefreshScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> RefreshScheduler<T> {
    pub fn new() -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            cache: DataCache::new(),
            tasks: HashMap::new(),
            in_flight: HashMap::new(),
            generations: HashMap::new(),
            cancelled_through: HashMap::new(),
            outcome_tx,
            outcome_rx,
            stats: SchedulerStats::default(),
            shut_down: false,
        }
    }

    /// Read-only view of the data fed by this scheduler.
    pub fn cache(&self) -> &DataCache<T> {
        &self.cache
    }

    /// Start (or replace) the timer for `key` and fire its first tick now.
    pub fn schedule(
        &mut self,
        key: impl Into<String>,
        interval: Duration,
        timeout: Duration,
        fetcher: Arc<dyn ResourceFetcher<T>>,
    ) -> TickResult {
        let key = key.into();
        if self.shut_down {
            warn!(event = "core.scheduler.schedule_after_shutdown", key = key.as_str());
            return TickResult::NotScheduled;
        }

        let next_fire = match Instant::now().checked_add(interval) {
            Some(next_fire) if !interval.is_zero() => next_fire,
            _ => {
                warn!(
                    event = "core.scheduler.invalid_interval",
                    key = key.as_str(),
                    interval_ms = interval.as_millis() as u64
                );
                return TickResult::NotScheduled;
            }
        };

        let replaced = self
            .tasks
            .insert(
                key.clone(),
                RefreshTask {
                    interval,
                    timeout,
                    next_fire,
                    fetcher,
                },
            )
            .is_some();

        info!(
            event = "core.scheduler.task_scheduled",
            key = key.as_str(),
            interval_ms = interval.as_millis() as u64,
            timeout_ms = timeout.as_millis() as u64,
            replaced = replaced
        );

        self.tick(&key)
    }

    /// Dispatch every tick that is due at `now`.
    ///
    /// Returns the keys that were due, in key order, with what happened to
    /// each. Deadlines missed by more than one interval are skipped rather
    /// than replayed.
    pub fn poll_due(&mut self, now: Instant) -> Vec<(String, TickResult)> {
        let mut due: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.next_fire <= now)
            .map(|(key, _)| key.clone())
            .collect();
        due.sort();

        due.into_iter()
            .map(|key| {
                if let Some(task) = self.tasks.get_mut(&key) {
                    task.next_fire = next_fire_after(task.next_fire, task.interval, now);
                }
                let result = self.tick(&key);
                (key, result)
            })
            .collect()
    }

    /// Earliest instant at which a tick is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.values().map(|task| task.next_fire).min()
    }

    /// Manual refresh of one key.
    ///
    /// When idle, fetches immediately and moves the key's next automatic tick
    /// to one full interval from now. A manual refresh that is still running
    /// is reported as [`RefreshRequest::AlreadyRefreshing`]. A running
    /// scheduled fetch is superseded: the new fetch gets a newer generation,
    /// so whichever finishes last, the cache ends up holding the manual
    /// result.
    pub fn force_refresh(&mut self, key: &str) -> RefreshRequest {
        if self.shut_down || !self.tasks.contains_key(key) {
            return RefreshRequest::NotScheduled;
        }

        if let Some(flight) = self.in_flight.get(key) {
            if flight.manual {
                info!(
                    event = "core.scheduler.refresh_already_running",
                    key = key,
                    generation = flight.generation
                );
                return RefreshRequest::AlreadyRefreshing;
            }
            info!(
                event = "core.scheduler.fetch_superseded",
                key = key,
                superseded_generation = flight.generation
            );
        }

        let now = Instant::now();
        if let Some(task) = self.tasks.get_mut(key) {
            task.next_fire = now.checked_add(task.interval).unwrap_or(task.next_fire);
        }

        match self.dispatch(key, true) {
            Some(generation) => RefreshRequest::Dispatched { generation },
            None => RefreshRequest::NotScheduled,
        }
    }

    /// Stop the timer for `key`. Results of a fetch still running for it are
    /// discarded. Idempotent.
    pub fn cancel(&mut self, key: &str) -> bool {
        let removed = self.tasks.remove(key).is_some();
        self.in_flight.remove(key);
        if let Some(&generation) = self.generations.get(key) {
            self.cancelled_through.insert(key.to_string(), generation);
        }
        if removed {
            info!(event = "core.scheduler.task_cancelled", key = key);
        }
        removed
    }

    /// Stop every timer. Idempotent.
    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            info!(
                event = "core.scheduler.all_cancelled",
                tasks = self.tasks.len(),
                in_flight = self.in_flight.len()
            );
        }
        let keys: Vec<String> = self.tasks.keys().cloned().collect();
        for key in keys {
            self.cancel(&key);
        }
    }

    /// Cancel everything and drop the cache. Outcomes that arrive afterwards
    /// are discarded.
    pub fn shutdown(&mut self) {
        let abandoned = self.in_flight.len();
        self.cancel_all();
        self.cache.clear();
        self.shut_down = true;
        self.outcome_rx.close();
        info!(
            event = "core.scheduler.shutdown_completed",
            abandoned_fetches = abandoned
        );
    }

    /// Wait for the next fetch to finish.
    ///
    /// Returns `None` only after [`shutdown`](Self::shutdown) once queued
    /// outcomes are drained.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome<T>> {
        self.outcome_rx.recv().await
    }

    /// Apply a finished fetch to the cache. Returns whether the cache changed.
    pub fn apply(&mut self, outcome: FetchOutcome<T>) -> bool {
        let FetchOutcome {
            key,
            generation,
            result,
            elapsed,
        } = outcome;

        if self
            .in_flight
            .get(&key)
            .is_some_and(|flight| flight.generation == generation)
        {
            self.in_flight.remove(&key);
        }

        let cancelled = self
            .cancelled_through
            .get(&key)
            .is_some_and(|&through| generation <= through);
        if self.shut_down || cancelled || !self.tasks.contains_key(&key) {
            self.stats.discarded += 1;
            debug!(
                event = "core.scheduler.outcome_discarded",
                key = key.as_str(),
                generation = generation
            );
            return false;
        }

        match result {
            Ok(value) => {
                self.stats.succeeded += 1;
                let accepted = self.cache.set(&key, value, generation);
                debug!(
                    event = "core.scheduler.fetch_completed",
                    key = key.as_str(),
                    generation = generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    accepted = accepted
                );
                accepted
            }
            Err(error) => {
                self.stats.failed += 1;
                self.cache.set_error(&key, generation, error.clone());
                warn!(
                    event = "core.scheduler.fetch_failed",
                    key = key.as_str(),
                    generation = generation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    consecutive_failures = self.cache.failure_count(&key),
                    error = %error
                );
                true
            }
        }
    }

    /// Wait for one outcome and apply it. Returns the key it belonged to.
    pub async fn settle_next(&mut self) -> Option<String> {
        let outcome = self.next_outcome().await?;
        let key = outcome.key.clone();
        self.apply(outcome);
        Some(key)
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn interval(&self, key: &str) -> Option<Duration> {
        self.tasks.get(key).map(|task| task.interval)
    }

    pub fn scheduled_keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    fn tick(&mut self, key: &str) -> TickResult {
        if !self.tasks.contains_key(key) {
            return TickResult::NotScheduled;
        }

        if let Some(flight) = self.in_flight.get(key) {
            self.stats.coalesced += 1;
            info!(
                event = "core.scheduler.tick_coalesced",
                key = key,
                in_flight_generation = flight.generation
            );
            return TickResult::Coalesced;
        }

        match self.dispatch(key, false) {
            Some(generation) => TickResult::Dispatched { generation },
            None => TickResult::NotScheduled,
        }
    }

    fn dispatch(&mut self, key: &str, manual: bool) -> Option<u64> {
        let task = self.tasks.get(key)?;

        let counter = self.generations.entry(key.to_string()).or_insert(0);
        *counter += 1;
        let generation = *counter;

        self.in_flight
            .insert(key.to_string(), InFlight { generation, manual });
        self.stats.dispatched += 1;

        debug!(
            event = "core.scheduler.tick_dispatched",
            key = key,
            generation = generation,
            manual = manual
        );

        let fetch = task.fetcher.fetch(key);
        let timeout = task.timeout;
        let tx = self.outcome_tx.clone();
        let key = key.to_string();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = match tokio::time::timeout(timeout, AssertUnwindSafe(fetch).catch_unwind())
                .await
            {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(FetchError::Panicked),
                Err(_) => Err(FetchError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                }),
            };

            // The receiver is closed after shutdown; the result is dropped.
            let _ = tx.send(FetchOutcome {
                key,
                generation,
                result,
                elapsed: started.elapsed(),
            });
        });

        Some(generation)
    }
}

#[cfg(test)]
mod tests;
