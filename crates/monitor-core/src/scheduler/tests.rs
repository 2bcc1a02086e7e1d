use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::time::{Instant, advance};

use super::*;

const TIMEOUT: Duration = Duration::from_secs(60);

type Gate = oneshot::Sender<Result<Value, FetchError>>;

/// Fetcher whose every call blocks until the test releases it, so tests
/// decide the completion order.
#[derive(Clone, Default)]
struct Gated {
    gates: Arc<Mutex<Vec<Option<Gate>>>>,
}

impl Gated {
    fn fetcher(&self) -> Arc<dyn ResourceFetcher> {
        let gates = self.gates.clone();
        Arc::new(move |_key: String| {
            let (tx, rx) = oneshot::channel();
            gates.lock().unwrap().push(Some(tx));
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(FetchError::adapter("gate dropped")))
            }
        })
    }

    fn calls(&self) -> usize {
        self.gates.lock().unwrap().len()
    }

    fn complete(&self, call: usize, result: Result<Value, FetchError>) {
        let gate = self.gates.lock().unwrap()[call]
            .take()
            .expect("call already completed");
        let _ = gate.send(result);
    }
}

#[tokio::test(start_paused = true)]
async fn test_schedule_fires_immediately() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();

    let result = scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());

    assert_eq!(result, TickResult::Dispatched { generation: 1 });
    assert_eq!(gated.calls(), 1);
    assert!(scheduler.is_in_flight("svc"));

    gated.complete(0, Ok(json!("v1")));
    assert_eq!(scheduler.settle_next().await.as_deref(), Some("svc"));
    assert_eq!(scheduler.cache().get("svc"), Some(&json!("v1")));
    assert!(!scheduler.is_in_flight("svc"));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_completion_keeps_highest_generation() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());

    assert_eq!(
        scheduler.force_refresh("svc"),
        RefreshRequest::Dispatched { generation: 2 }
    );

    // Generation 2 finishes first, generation 1 straggles in afterwards
    gated.complete(1, Ok(json!("new")));
    scheduler.settle_next().await;
    gated.complete(0, Ok(json!("old")));
    scheduler.settle_next().await;

    assert_eq!(scheduler.cache().get("svc"), Some(&json!("new")));
    assert_eq!(scheduler.cache().entry("svc").unwrap().generation, 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_tick_is_skipped() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());

    advance(Duration::from_secs(5)).await;
    let ticks = scheduler.poll_due(Instant::now());
    assert_eq!(ticks, vec![("svc".to_string(), TickResult::Coalesced)]);

    advance(Duration::from_secs(5)).await;
    scheduler.poll_due(Instant::now());
    assert_eq!(gated.calls(), 1);
    assert_eq!(scheduler.stats().coalesced, 2);

    gated.complete(0, Ok(json!(1)));
    scheduler.settle_next().await;

    advance(Duration::from_secs(5)).await;
    let ticks = scheduler.poll_due(Instant::now());
    assert_eq!(
        ticks,
        vec![("svc".to_string(), TickResult::Dispatched { generation: 2 })]
    );
    assert_eq!(gated.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fixed_rate_from_tick_start() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    let start = Instant::now();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());

    // A slow fetch does not push the next deadline back
    advance(Duration::from_secs(3)).await;
    gated.complete(0, Ok(json!(1)));
    scheduler.settle_next().await;
    assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_secs(5)));

    // Missed deadlines are skipped, not replayed
    advance(Duration::from_secs(14)).await;
    let ticks = scheduler.poll_due(Instant::now());
    assert_eq!(ticks.len(), 1);
    assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_secs(20)));
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_when_idle_resets_baseline() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    gated.complete(0, Ok(json!(1)));
    scheduler.settle_next().await;

    advance(Duration::from_secs(3)).await;
    let now = Instant::now();
    assert_eq!(
        scheduler.force_refresh("svc"),
        RefreshRequest::Dispatched { generation: 2 }
    );
    assert_eq!(gated.calls(), 2);
    assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_secs(5)));

    gated.complete(1, Ok(json!(2)));
    scheduler.settle_next().await;

    // The original t=5s tick no longer fires
    advance(Duration::from_secs(2)).await;
    assert!(scheduler.poll_due(Instant::now()).is_empty());
    assert_eq!(gated.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_while_manual_refresh_running() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    gated.complete(0, Ok(json!(1)));
    scheduler.settle_next().await;

    scheduler.force_refresh("svc");
    assert_eq!(
        scheduler.force_refresh("svc"),
        RefreshRequest::AlreadyRefreshing
    );
    assert_eq!(gated.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_unknown_key() {
    let mut scheduler: RefreshScheduler = RefreshScheduler::new();
    assert_eq!(
        scheduler.force_refresh("nope"),
        RefreshRequest::NotScheduled
    );
}

/// A at 5s, B at 30s. A's second tick is slow, a manual refresh overtakes
/// it, and the late result is rejected.
#[tokio::test(start_paused = true)]
async fn test_slow_tick_overtaken_by_manual_refresh() {
    let a = Gated::default();
    let b = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("A", Duration::from_millis(5000), TIMEOUT, a.fetcher());
    scheduler.schedule("B", Duration::from_millis(30000), TIMEOUT, b.fetcher());

    // t=0: gen 1 completes with V1
    a.complete(0, Ok(json!("V1")));
    scheduler.settle_next().await;
    assert_eq!(scheduler.cache().get("A"), Some(&json!("V1")));

    // t=5000: gen 2 starts and hangs
    advance(Duration::from_millis(5000)).await;
    let ticks = scheduler.poll_due(Instant::now());
    assert_eq!(
        ticks,
        vec![("A".to_string(), TickResult::Dispatched { generation: 2 })]
    );

    // t=6000: manual refresh dispatches gen 3
    advance(Duration::from_millis(1000)).await;
    assert_eq!(
        scheduler.force_refresh("A"),
        RefreshRequest::Dispatched { generation: 3 }
    );

    // t=7000: gen 3 completes with V3
    advance(Duration::from_millis(1000)).await;
    a.complete(2, Ok(json!("V3")));
    scheduler.settle_next().await;
    assert_eq!(scheduler.cache().get("A"), Some(&json!("V3")));

    // t=12000: gen 2 finally completes with V2 and is rejected
    advance(Duration::from_millis(5000)).await;
    a.complete(1, Ok(json!("V2")));
    scheduler.settle_next().await;
    assert_eq!(scheduler.cache().get("A"), Some(&json!("V3")));
    assert_eq!(scheduler.cache().entry("A").unwrap().generation, 3);
    assert_eq!(b.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failures_keep_last_value() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("docker:prod", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    gated.complete(0, Ok(json!([{ "name": "api" }])));
    scheduler.settle_next().await;

    for call in 1..=3 {
        advance(Duration::from_secs(5)).await;
        scheduler.poll_due(Instant::now());
        gated.complete(call, Err(FetchError::adapter("ssh: connection refused")));
        scheduler.settle_next().await;
    }

    let cache = scheduler.cache();
    assert_eq!(cache.failure_count("docker:prod"), 3);
    assert_eq!(cache.get("docker:prod"), Some(&json!([{ "name": "api" }])));
    assert!(cache.error("docker:prod").is_some());
    assert_eq!(scheduler.stats().failed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_a_failure() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule(
        "ec2:prod",
        Duration::from_secs(30),
        Duration::from_secs(1),
        gated.fetcher(),
    );

    // Nothing completes the gate; the paused clock runs to the timeout
    scheduler.settle_next().await;

    assert_eq!(
        scheduler.cache().error("ec2:prod"),
        Some(&FetchError::Timeout { after_ms: 1000 })
    );
    assert!(!scheduler.is_in_flight("ec2:prod"));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_fetcher_clears_in_flight() {
    let mut scheduler = RefreshScheduler::new();
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(|_key: String| async move {
        if true {
            panic!("adapter bug");
        }
        Ok::<Value, FetchError>(Value::Null)
    });
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, fetcher);

    scheduler.settle_next().await;

    assert_eq!(scheduler.cache().error("svc"), Some(&FetchError::Panicked));
    assert!(!scheduler.is_in_flight("svc"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent_and_discards_results() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());

    assert!(scheduler.cancel("svc"));
    assert!(!scheduler.cancel("svc"));
    assert!(scheduler.next_deadline().is_none());

    gated.complete(0, Ok(json!("late")));
    scheduler.settle_next().await;
    assert!(scheduler.cache().get("svc").is_none());
    assert_eq!(scheduler.stats().discarded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reschedule_continues_generations() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    gated.complete(0, Ok(json!(1)));
    scheduler.settle_next().await;

    scheduler.cancel("svc");
    let result = scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    assert_eq!(result, TickResult::Dispatched { generation: 2 });

    gated.complete(1, Ok(json!(2)));
    scheduler.settle_next().await;
    assert_eq!(scheduler.cache().get("svc"), Some(&json!(2)));
}

#[tokio::test(start_paused = true)]
async fn test_result_from_before_cancel_is_discarded_after_reschedule() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    scheduler.cancel("svc");

    // Not coalesced with the abandoned fetch
    let result = scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    assert_eq!(result, TickResult::Dispatched { generation: 2 });

    gated.complete(0, Ok(json!("from before cancel")));
    scheduler.settle_next().await;
    assert!(scheduler.cache().get("svc").is_none());
    assert!(scheduler.is_in_flight("svc"));

    gated.complete(1, Ok(json!("fresh")));
    scheduler.settle_next().await;
    assert_eq!(scheduler.cache().get("svc"), Some(&json!("fresh")));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_late_results() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();
    scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher());
    scheduler.shutdown();
    scheduler.shutdown();

    gated.complete(0, Ok(json!("late")));
    tokio::task::yield_now().await;

    while let Some(outcome) = scheduler.next_outcome().await {
        assert!(!scheduler.apply(outcome));
    }
    assert!(scheduler.cache().is_empty());
    assert!(scheduler.next_deadline().is_none());
    assert_eq!(
        scheduler.schedule("svc", Duration::from_secs(5), TIMEOUT, gated.fetcher()),
        TickResult::NotScheduled
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_rejected() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();

    assert_eq!(
        scheduler.schedule("svc", Duration::ZERO, TIMEOUT, gated.fetcher()),
        TickResult::NotScheduled
    );
    assert_eq!(gated.calls(), 0);
    assert!(scheduler.next_deadline().is_none());
    assert!(scheduler.poll_due(Instant::now()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_interval_is_rejected() {
    let gated = Gated::default();
    let mut scheduler = RefreshScheduler::new();

    assert_eq!(
        scheduler.schedule("svc", Duration::MAX, TIMEOUT, gated.fetcher()),
        TickResult::NotScheduled
    );
    assert_eq!(scheduler.scheduled_keys().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_next_fire_skips_to_first_future_slot() {
    let start = Instant::now();
    let interval = Duration::from_secs(5);

    assert_eq!(next_fire_after(start, interval, start), start + interval);
    assert_eq!(
        next_fire_after(start, interval, start + Duration::from_secs(4)),
        start + interval
    );
    assert_eq!(
        next_fire_after(start, interval, start + Duration::from_secs(10)),
        start + Duration::from_secs(15)
    );
    assert_eq!(
        next_fire_after(start, interval, start + Duration::from_secs(14)),
        start + Duration::from_secs(15)
    );
}
