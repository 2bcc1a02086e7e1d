//! Terminal host for the live dashboard.
//!
//! [`Dashboard`] holds the engine state and reacts to one event at a time;
//! [`run`] owns the terminal and feeds it key presses, fetch outcomes,
//! timer deadlines and the clock.

pub mod draw;
pub mod input;
pub mod terminal;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use monitor_core::fetch::ResourceFetcher;
use monitor_core::panels::StatusThresholds;
use monitor_core::plan::{DashboardPlan, ResourcePlan};
use monitor_core::scheduler::FetchOutcome;
use monitor_core::shell::{RenderTrigger, affects_active_panel};
use monitor_core::{
    Action, CacheSnapshot, DashboardError, KeyInput, NavigationController, RefreshScheduler,
    ShellState, events,
};

use draw::Screen;
use terminal::TerminalGuard;

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(Option<RenderTrigger>),
    Quit,
}

pub struct Dashboard {
    env: String,
    nav: NavigationController,
    scheduler: RefreshScheduler,
    shell: ShellState,
    thresholds: StatusThresholds,
    intervals: HashMap<String, Duration>,
    resources: Vec<ResourcePlan>,
}

impl Dashboard {
    pub fn new(plan: DashboardPlan, width: u16, height: u16) -> Result<Self, DashboardError> {
        if plan.panels.is_empty() {
            return Err(DashboardError::NoPanels);
        }

        let intervals = plan.intervals();
        let mut nav = NavigationController::new(plan.bindings);
        for panel in plan.panels {
            nav.register(panel);
        }
        nav.init();

        Ok(Self {
            shell: ShellState::new(plan.title, plan.env.clone(), width, height),
            env: plan.env,
            nav,
            scheduler: RefreshScheduler::new(),
            thresholds: plan.thresholds,
            intervals,
            resources: plan.resources,
        })
    }

    /// Start every resource timer. Each fires its first fetch immediately.
    pub fn start(&mut self) {
        for resource in self.resources.clone() {
            let fetcher = resource.fetcher();
            self.schedule_resource(&resource, fetcher);
        }
        events::log_dashboard_started(&self.env, self.nav.panels().len(), self.resources.len());
    }

    pub fn schedule_resource(&mut self, resource: &ResourcePlan, fetcher: Arc<dyn ResourceFetcher>) {
        self.scheduler
            .schedule(resource.key.clone(), resource.interval, resource.timeout, fetcher);
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RefreshScheduler {
        &mut self.scheduler
    }

    pub fn nav(&self) -> &NavigationController {
        &self.nav
    }

    pub fn on_key(&mut self, key: KeyInput) -> Step {
        match self.nav.dispatch(key) {
            Action::Quit => Step::Quit,
            Action::Render => Step::Continue(Some(RenderTrigger::Activation)),
            Action::Refresh(keys) => {
                let results: Vec<_> = keys
                    .into_iter()
                    .map(|key| {
                        let result = self.scheduler.force_refresh(&key);
                        (key, result)
                    })
                    .collect();
                info!(
                    event = "cli.dashboard.manual_refresh",
                    panel_id = self.nav.active_id().unwrap_or_default(),
                    keys = results.len()
                );
                self.shell
                    .record_refresh(&results, Local::now(), Instant::now());
                Step::Continue(Some(RenderTrigger::ManualRefresh))
            }
            Action::None => Step::Continue(None),
        }
    }

    pub fn on_outcome(&mut self, outcome: FetchOutcome<serde_json::Value>) -> Step {
        let key = outcome.key.clone();
        let changed = self.scheduler.apply(outcome);
        if changed && affects_active_panel(&self.nav, &key) {
            Step::Continue(Some(RenderTrigger::FetchCompleted))
        } else {
            Step::Continue(None)
        }
    }

    pub fn on_deadline(&mut self, now: Instant) -> Step {
        let ticks = self.scheduler.poll_due(now);
        debug!(event = "cli.dashboard.ticks_due", count = ticks.len());
        Step::Continue(None)
    }

    pub fn on_resize(&mut self, width: u16, height: u16) -> Step {
        if self.shell.resize(width, height) {
            Step::Continue(Some(RenderTrigger::Resize))
        } else {
            Step::Continue(None)
        }
    }

    pub fn on_clock(&mut self, now: Instant) -> Step {
        self.shell.expire_notice(now);
        Step::Continue(Some(RenderTrigger::ClockTick))
    }

    /// Render the active panel from cache along with the chrome.
    pub fn screen(&self, wall_clock: DateTime<Local>, now: Instant) -> Screen {
        let snapshot = CacheSnapshot::new(self.scheduler.cache(), now, self.thresholds)
            .with_intervals(&self.intervals);
        let (body, scroll) = match self.nav.active_panel() {
            Some(panel) => (panel.render_guarded(&snapshot), panel.scroll()),
            None => Default::default(),
        };

        Screen {
            header: self.shell.header(wall_clock),
            tabs: self.shell.tabs(&self.nav),
            body,
            footer: self
                .shell
                .footer(&self.nav, self.scheduler.in_flight_count(), now),
            scroll,
        }
    }

    pub fn shutdown(&mut self, reason: &str) {
        self.scheduler.shutdown();
        events::log_dashboard_stopped(&self.env, reason);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Run the dashboard until the user quits.
pub async fn run(plan: DashboardPlan) -> Result<(), DashboardError> {
    let mut guard = TerminalGuard::enter()?;
    let size = guard.terminal().size()?;
    let mut dashboard = Dashboard::new(plan, size.width, size.height)?;
    dashboard.start();

    let mut events = EventStream::new();
    let mut clock = tokio::time::interval(CLOCK_TICK);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());

    let mut trigger = Some(RenderTrigger::Activation);
    let reason = loop {
        if let Some(reason) = trigger.take() {
            debug!(event = "cli.dashboard.render", trigger = reason.as_str());
            let screen = dashboard.screen(Local::now(), Instant::now());
            if let Err(e) = guard.terminal().draw(|frame| draw::draw(frame, &screen)) {
                dashboard.shutdown("error");
                return Err(e.into());
            }
        }

        let deadline = dashboard.scheduler().next_deadline();
        let step = tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => match input::key_input(&key) {
                    Some(key) => dashboard.on_key(key),
                    None => Step::Continue(None),
                },
                Some(Ok(Event::Resize(width, height))) => dashboard.on_resize(width, height),
                Some(Ok(_)) => Step::Continue(None),
                Some(Err(e)) => {
                    dashboard.shutdown("error");
                    return Err(e.into());
                }
                None => break "input_closed",
            },
            Some(outcome) = dashboard.scheduler_mut().next_outcome() => dashboard.on_outcome(outcome),
            _ = sleep_until(deadline) => dashboard.on_deadline(Instant::now()),
            _ = clock.tick() => dashboard.on_clock(Instant::now()),
            _ = &mut interrupt => break "signal",
        };

        match step {
            Step::Quit => break "quit",
            Step::Continue(next) => trigger = trigger.or(next),
        }
    };

    dashboard.shutdown(reason);
    info!(event = "cli.dashboard.exited", reason = reason);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::config::MonitorConfig;
    use monitor_core::fetch::FetchError;
    use monitor_core::scheduler::RefreshRequest;
    use serde_json::json;

    const LAYOUT: &str = r#"
[resources.containers]
adapter = "command"
command = "true"
key = "docker:{env}"
interval_secs = 5

[resources.services]
adapter = "tcp"
targets = ["auth=127.0.0.1:1"]

[[panels]]
id = "services"
label = "Services"
kind = "service_health"
resources = ["services"]

[[panels]]
id = "containers"
label = "Containers"
kind = "containers"
resources = ["containers"]
"#;

    fn dashboard() -> Dashboard {
        let config: MonitorConfig = toml::from_str(LAYOUT).unwrap();
        let plan = DashboardPlan::build(&config, "prod", None).unwrap();
        Dashboard::new(plan, 120, 30).unwrap()
    }

    fn start_with_values(dashboard: &mut Dashboard) {
        let fixtures = [
            ("docker:prod", json!([{"name": "api", "cpu_percent": 12.0}])),
            ("services:prod", json!([{"name": "auth", "status": "healthy"}])),
        ];
        for resource in dashboard.resources.clone() {
            let value = fixtures
                .iter()
                .find(|(key, _)| *key == resource.key)
                .map(|(_, value)| value.clone())
                .unwrap();
            let fetcher: Arc<dyn ResourceFetcher> = Arc::new(move |_key: String| {
                let value = value.clone();
                async move { Ok::<_, FetchError>(value) }
            });
            dashboard.schedule_resource(&resource, fetcher);
        }
    }

    async fn settle(dashboard: &mut Dashboard) -> Vec<Step> {
        let mut steps = Vec::new();
        while dashboard.scheduler().in_flight_count() > 0 {
            let outcome = dashboard.scheduler_mut().next_outcome().await.unwrap();
            steps.push(dashboard.on_outcome(outcome));
        }
        steps
    }

    #[test]
    fn test_no_panels_is_fatal() {
        let config: MonitorConfig = toml::from_str("").unwrap();
        let plan = DashboardPlan::build(&config, "prod", None).unwrap();
        assert!(matches!(
            Dashboard::new(plan, 80, 24),
            Err(DashboardError::NoPanels)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_render_shows_loading_then_data() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);

        let screen = dashboard.screen(Local::now(), Instant::now());
        assert!(screen.header.to_plain().starts_with(" monitor · prod"));
        assert!(screen.body.to_plain().contains("services:prod  loading"));

        let steps = settle(&mut dashboard).await;
        // Only the visible panel's key asks for a redraw
        assert!(steps.contains(&Step::Continue(Some(RenderTrigger::FetchCompleted))));
        assert!(steps.contains(&Step::Continue(None)));

        let screen = dashboard.screen(Local::now(), Instant::now());
        assert!(screen.body.to_plain().contains("auth"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_panels_never_fetches() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);
        settle(&mut dashboard).await;
        let dispatched = dashboard.scheduler().stats().dispatched;

        assert_eq!(
            dashboard.on_key(KeyInput::Tab),
            Step::Continue(Some(RenderTrigger::Activation))
        );
        assert_eq!(dashboard.nav().active_id(), Some("containers"));
        assert_eq!(dashboard.scheduler().stats().dispatched, dispatched);

        let screen = dashboard.screen(Local::now(), Instant::now());
        assert!(screen.body.to_plain().contains("api"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_key_targets_active_panel() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);
        settle(&mut dashboard).await;

        assert_eq!(
            dashboard.on_key(KeyInput::Char('r')),
            Step::Continue(Some(RenderTrigger::ManualRefresh))
        );
        assert!(dashboard.scheduler().is_in_flight("services:prod"));
        assert!(!dashboard.scheduler().is_in_flight("docker:prod"));
        assert_eq!(
            dashboard.scheduler_mut().force_refresh("services:prod"),
            RefreshRequest::AlreadyRefreshing
        );

        let footer = dashboard.screen(Local::now(), Instant::now()).footer.to_plain();
        assert!(footer.contains("refreshing 1 resource"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_dispatches_due_ticks() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);
        settle(&mut dashboard).await;

        let deadline = dashboard.scheduler().next_deadline().unwrap();
        tokio::time::advance(deadline - Instant::now()).await;
        dashboard.on_deadline(Instant::now());
        assert!(dashboard.scheduler().in_flight_count() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_and_clock_render_without_fetching() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);
        settle(&mut dashboard).await;
        let dispatched = dashboard.scheduler().stats().dispatched;

        assert_eq!(dashboard.on_resize(120, 30), Step::Continue(None));
        assert_eq!(
            dashboard.on_resize(70, 30),
            Step::Continue(Some(RenderTrigger::Resize))
        );
        assert_eq!(
            dashboard.on_clock(Instant::now()),
            Step::Continue(Some(RenderTrigger::ClockTick))
        );
        let screen = dashboard.screen(Local::now(), Instant::now());
        assert!(screen.body.to_plain().contains("auth"));

        assert_eq!(dashboard.scheduler().stats().dispatched, dispatched);
        assert_eq!(dashboard.scheduler().in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_and_shutdown() {
        let mut dashboard = dashboard();
        start_with_values(&mut dashboard);
        assert_eq!(dashboard.on_key(KeyInput::Char('q')), Step::Quit);

        dashboard.shutdown("quit");
        assert!(dashboard.scheduler().next_deadline().is_none());
        assert!(dashboard.scheduler().cache().is_empty());
    }
}
