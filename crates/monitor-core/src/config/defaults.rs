//! Default values for configuration types.
//!
//! Every optional setting resolves through an accessor here so that the
//! fallback lives in one place. The built-in panel layout is used when no
//! config file declares `[[panels]]`.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::types::{
    AdapterKind, DashboardConfig, MonitorConfig, PanelConfig, PanelKind, ResourceConfig,
};

pub const DEFAULT_TITLE: &str = "monitor";
pub const DEFAULT_ENV: &str = "staging";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_STALENESS_MULTIPLIER: u32 = 2;
pub const DEFAULT_OFFLINE_AFTER_FAILURES: u32 = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 45;

impl DashboardConfig {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn default_env(&self) -> &str {
        self.default_env.as_deref().unwrap_or(DEFAULT_ENV)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn staleness_multiplier(&self) -> u32 {
        self.staleness_multiplier
            .unwrap_or(DEFAULT_STALENESS_MULTIPLIER)
    }

    pub fn offline_after_failures(&self) -> u32 {
        self.offline_after_failures
            .unwrap_or(DEFAULT_OFFLINE_AFTER_FAILURES)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shell_timeout_secs
                .unwrap_or(DEFAULT_SHELL_TIMEOUT_SECS),
        )
    }
}

fn panel(id: &str, label: &str, kind: PanelKind, description: &str, resources: &[&str]) -> PanelConfig {
    PanelConfig {
        id: id.to_string(),
        label: label.to_string(),
        kind,
        description: Some(description.to_string()),
        resources: resources.iter().map(|r| r.to_string()).collect(),
        interval_secs: None,
    }
}

fn adapter_command(name: &str) -> ResourceConfig {
    ResourceConfig {
        adapter: AdapterKind::Command,
        key: None,
        command: Some(format!("ops-adapter {} --env {{env}} --json", name)),
        targets: Vec::new(),
        timeout_secs: None,
        interval_secs: None,
    }
}

/// Panels registered when the config declares none.
pub fn builtin_panels() -> Vec<PanelConfig> {
    vec![
        panel(
            "overview",
            "Overview",
            PanelKind::Overview,
            "Freshness and failures of every monitored resource",
            &[],
        ),
        panel(
            "services",
            "Services",
            PanelKind::ServiceHealth,
            "Health probes for deployed services",
            &["services"],
        ),
        panel(
            "infra",
            "Infrastructure",
            PanelKind::Infrastructure,
            "Compute instances in the environment",
            &["instances"],
        ),
        panel(
            "containers",
            "Containers",
            PanelKind::Containers,
            "Container CPU and memory usage",
            &["containers"],
        ),
        panel(
            "deploy",
            "Blue/Green",
            PanelKind::BlueGreen,
            "Active deployment slot and slot health",
            &["deployment"],
        ),
    ]
}

/// Resources backing [`builtin_panels`]. Each shells out to a site-provided
/// `ops-adapter` wrapper that prints JSON.
pub fn builtin_resources() -> BTreeMap<String, ResourceConfig> {
    ["services", "instances", "containers", "deployment"]
        .into_iter()
        .map(|name| (name.to_string(), adapter_command(name)))
        .collect()
}

impl MonitorConfig {
    /// Fill in the built-in layout when no panels were configured.
    ///
    /// Resources the user defined are kept; built-in ones are only added
    /// under names that are still free.
    pub fn with_builtin_layout(mut self) -> Self {
        if self.panels.is_empty() {
            self.panels = builtin_panels();
            for (name, resource) in builtin_resources() {
                self.resources.entry(name).or_insert(resource);
            }
        }
        self
    }
}
