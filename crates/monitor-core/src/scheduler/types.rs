use std::time::Duration;

use serde::Serialize;

use crate::fetch::FetchError;

/// Result of one finished fetch, sent from the fetch task to the scheduler.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub key: String,
    /// Generation assigned when the fetch was dispatched.
    pub generation: u64,
    pub result: Result<T, FetchError>,
    pub elapsed: Duration,
}

/// What a timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Dispatched { generation: u64 },
    /// The key's previous fetch is still running; this tick was skipped.
    Coalesced,
    NotScheduled,
}

/// What a manual refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequest {
    Dispatched { generation: u64 },
    AlreadyRefreshing,
    NotScheduled,
}

/// Counters since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub dispatched: u64,
    pub coalesced: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Outcomes that arrived for a cancelled key or after shutdown.
    pub discarded: u64,
}
