//! Turns a validated [`MonitorConfig`] into what the dashboard runs: the
//! panels to register and one scheduled resource per cache key.
//!
//! `{env}` in resource keys, commands and probe targets is replaced with the
//! selected environment here, so nothing downstream knows about templates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::{AdapterKind, MonitorConfig, PanelKind};
use crate::errors::ConfigError;
use crate::fetch::command::CommandFetcher;
use crate::fetch::probe::{ProbeTarget, TcpProbeFetcher};
use crate::fetch::{ResourceClass, ResourceFetcher};
use crate::navigation::KeyBindings;
use crate::panels::{Panel, PanelDescriptor, PanelResource, StatusThresholds};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    Command(String),
    Tcp(Vec<ProbeTarget>),
}

/// One resource key as it will be scheduled.
#[derive(Debug, Clone)]
pub struct ResourcePlan {
    pub name: String,
    pub key: String,
    pub class: ResourceClass,
    pub interval: Duration,
    pub timeout: Duration,
    pub source: ResourceSource,
}

impl ResourcePlan {
    pub fn fetcher(&self) -> Arc<dyn ResourceFetcher> {
        match &self.source {
            ResourceSource::Command(command) => Arc::new(CommandFetcher::new(command.clone())),
            // Per-target connects must give up before the fetch as a whole does.
            ResourceSource::Tcp(targets) => {
                Arc::new(TcpProbeFetcher::new(targets.clone(), self.timeout / 2))
            }
        }
    }

    pub fn adapter(&self) -> AdapterKind {
        match self.source {
            ResourceSource::Command(_) => AdapterKind::Command,
            ResourceSource::Tcp(_) => AdapterKind::Tcp,
        }
    }

    /// Command line or probe target list, for listings.
    pub fn target(&self) -> String {
        match &self.source {
            ResourceSource::Command(command) => command.clone(),
            ResourceSource::Tcp(targets) => targets
                .iter()
                .map(|t| format!("{}={}", t.name, t.address))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug)]
pub struct DashboardPlan {
    pub title: String,
    pub env: String,
    pub panels: Vec<Panel>,
    /// Scheduled resources in key order.
    pub resources: Vec<ResourcePlan>,
    pub thresholds: StatusThresholds,
    pub bindings: KeyBindings,
}

fn substitute(template: &str, env: &str) -> String {
    template.replace("{env}", env)
}

impl DashboardPlan {
    /// Build the plan for `env`. `interval_override` (the `--interval` flag)
    /// replaces every configured refresh interval.
    pub fn build(
        config: &MonitorConfig,
        env: &str,
        interval_override: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let dashboard = &config.dashboard;
        let default_interval = interval_override.unwrap_or_else(|| dashboard.refresh_interval());

        let keys: BTreeMap<&str, String> = config
            .resources
            .iter()
            .map(|(name, resource)| {
                let key = match &resource.key {
                    Some(template) => substitute(template, env),
                    None => format!("{}:{}", name, env),
                };
                (name.as_str(), key)
            })
            .collect();

        let mut panels = Vec::with_capacity(config.panels.len());
        // Shortest interval of any panel showing each resource
        let mut wanted: BTreeMap<&str, Duration> = BTreeMap::new();

        for panel in &config.panels {
            let interval = interval_override
                .or(panel.interval_secs.map(Duration::from_secs))
                .unwrap_or(default_interval);

            let names: Vec<&str> = if panel.kind == PanelKind::Overview && panel.resources.is_empty() {
                config.resources.keys().map(String::as_str).collect()
            } else {
                panel.resources.iter().map(String::as_str).collect()
            };

            let mut resources = Vec::with_capacity(names.len());
            for name in names {
                let key = keys.get(name).ok_or_else(|| ConfigError::UndefinedResource {
                    panel: panel.id.clone(),
                    resource: name.to_string(),
                })?;
                wanted
                    .entry(name)
                    .and_modify(|d| *d = (*d).min(interval))
                    .or_insert(interval);
                resources.push(PanelResource {
                    name: name.to_string(),
                    key: key.clone(),
                });
            }

            panels.push(Panel::new(
                PanelDescriptor {
                    id: panel.id.clone(),
                    label: panel.label.clone(),
                    refresh_interval: interval,
                    description: panel.description.clone(),
                },
                panel.kind,
                resources,
            ));
        }

        let mut resources = Vec::with_capacity(wanted.len());
        for (name, panel_interval) in wanted {
            let resource = &config.resources[name];
            let class = ResourceClass::for_adapter(resource.adapter);
            let interval = interval_override
                .or(resource.interval_secs.map(Duration::from_secs))
                .unwrap_or(panel_interval);
            let timeout = resource
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| class.default_timeout(dashboard));

            let source = match resource.adapter {
                AdapterKind::Command => ResourceSource::Command(substitute(
                    resource.command.as_deref().unwrap_or_default(),
                    env,
                )),
                AdapterKind::Tcp => ResourceSource::Tcp(
                    resource
                        .targets
                        .iter()
                        .map(|t| {
                            ProbeTarget::parse(&substitute(t, env)).map_err(|e| {
                                ConfigError::InvalidConfiguration {
                                    message: format!("resources.{}: {}", name, e),
                                }
                            })
                        })
                        .collect::<Result<_, _>>()?,
                ),
            };

            resources.push(ResourcePlan {
                name: name.to_string(),
                key: keys[name].clone(),
                class,
                interval,
                timeout,
                source,
            });
        }
        resources.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(pair) = resources.windows(2).find(|pair| pair[0].key == pair[1].key) {
            return Err(ConfigError::InvalidConfiguration {
                message: format!(
                    "resources.{} and resources.{} share the cache key '{}'",
                    pair[0].name, pair[1].name, pair[0].key
                ),
            });
        }

        let unused = config.resources.len() - resources.len();
        if unused > 0 {
            debug!(event = "core.plan.unused_resources", count = unused);
        }

        Ok(Self {
            title: dashboard.title().to_string(),
            env: env.to_string(),
            panels,
            resources,
            thresholds: StatusThresholds::from_config(dashboard),
            bindings: KeyBindings::from_config(&config.keys)?,
        })
    }

    /// Refresh interval per cache key, for staleness checks.
    pub fn intervals(&self) -> HashMap<String, Duration> {
        self.resources
            .iter()
            .map(|r| (r.key.clone(), r.interval))
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            env: self.env.clone(),
            panels: self
                .panels
                .iter()
                .enumerate()
                .map(|(i, panel)| PanelSummary {
                    position: i + 1,
                    id: panel.id().to_string(),
                    label: panel.label().to_string(),
                    kind: panel.kind().as_str(),
                    refresh_interval_secs: panel.descriptor().refresh_interval.as_secs(),
                    resources: panel.resource_keys(),
                })
                .collect(),
            resources: self
                .resources
                .iter()
                .map(|r| ResourceSummary {
                    name: r.name.clone(),
                    key: r.key.clone(),
                    adapter: r.adapter(),
                    class: r.class.as_str(),
                    interval_secs: r.interval.as_secs(),
                    timeout_secs: r.timeout.as_secs(),
                    target: r.target(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a plan, used by `monitor panels`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub env: String,
    pub panels: Vec<PanelSummary>,
    pub resources: Vec<ResourceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelSummary {
    pub position: usize,
    pub id: String,
    pub label: String,
    pub kind: &'static str,
    pub refresh_interval_secs: u64,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    pub key: String,
    pub adapter: AdapterKind,
    pub class: &'static str,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub target: String,
}
