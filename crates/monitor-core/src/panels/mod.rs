//! Dashboard panels.
//!
//! A panel is a view over cached data: it renders whatever the cache holds
//! for its resource keys at the moment of the snapshot and never fetches.
//! Which renderer runs is chosen by [`PanelKind`].

pub mod content;
pub mod errors;
pub mod render;
pub mod snapshot;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PanelKind;

pub use content::{ContentLine, PanelContent, Segment, Tone};
pub use errors::RenderError;
pub use snapshot::{CacheSnapshot, ResourceStatus, ResourceView, StatusThresholds};

/// Static description of a panel, registered once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelDescriptor {
    pub id: String,
    pub label: String,
    #[serde(rename = "refresh_interval_secs", serialize_with = "as_secs")]
    pub refresh_interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// A resource shown by a panel: its configured name and its cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelResource {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Panel {
    descriptor: PanelDescriptor,
    kind: PanelKind,
    resources: Vec<PanelResource>,
    scroll: u16,
    active: bool,
}

impl Panel {
    pub fn new(descriptor: PanelDescriptor, kind: PanelKind, resources: Vec<PanelResource>) -> Self {
        Self {
            descriptor,
            kind,
            resources,
            scroll: 0,
            active: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn resources(&self) -> &[PanelResource] {
        &self.resources
    }

    pub fn resource_keys(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.key.clone()).collect()
    }

    pub fn shows_key(&self, key: &str) -> bool {
        self.resources.iter().any(|r| r.key == key)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = i32::from(self.scroll).saturating_add(delta);
        self.scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }

    pub fn on_activate(&mut self) {
        self.active = true;
        debug!(event = "core.panel.activated", panel_id = self.descriptor.id.as_str());
    }

    pub fn on_deactivate(&mut self) {
        self.active = false;
        self.scroll = 0;
        debug!(event = "core.panel.deactivated", panel_id = self.descriptor.id.as_str());
    }

    pub fn render(&self, snapshot: &CacheSnapshot<'_>) -> Result<PanelContent, RenderError> {
        let mut content = PanelContent::new();
        let mut heading = ContentLine::text(self.descriptor.label.clone(), Tone::Heading);
        if let Some(description) = &self.descriptor.description {
            heading = heading.push(format!("  {}", description), Tone::Muted);
        }
        content.line(heading);
        content.blank();

        if self.resources.is_empty() {
            content.line(ContentLine::text("no resources configured", Tone::Muted));
            return Ok(content);
        }

        if self.kind == PanelKind::Overview {
            content.extend(self.overview_rows(snapshot));
            return Ok(content);
        }

        for (i, resource) in self.resources.iter().enumerate() {
            if i > 0 {
                content.blank();
            }
            let view = snapshot.view(&resource.key, self.descriptor.refresh_interval);
            content.line(status_line(&view));

            let Some(value) = view.value else {
                continue;
            };
            // A bad value only replaces its own resource's rows
            let body = match self.render_body(&resource.key, value) {
                Ok(body) => body,
                Err(error) => {
                    warn!(
                        event = "core.panel.resource_render_failed",
                        panel_id = self.descriptor.id.as_str(),
                        key = resource.key.as_str(),
                        error = %error
                    );
                    content.line(ContentLine::text(format!("⚠ {}", error), Tone::Warning));
                    continue;
                }
            };
            if view.status == ResourceStatus::Fresh {
                content.extend(body);
            } else {
                content.extend(body.into_iter().map(|line| line.dimmed(Tone::Stale)));
            }
        }
        Ok(content)
    }

    fn render_body(&self, key: &str, value: &Value) -> Result<Vec<ContentLine>, RenderError> {
        if value.is_null() {
            return Ok(render::empty("data"));
        }
        match self.kind {
            PanelKind::ServiceHealth => render::service_health(key, value),
            PanelKind::Infrastructure => render::infrastructure(key, value),
            PanelKind::Containers => render::containers(key, value),
            PanelKind::BlueGreen => render::blue_green(key, value),
            PanelKind::Overview => Ok(Vec::new()),
        }
    }

    /// Render, replacing any error or panic with a placeholder.
    pub fn render_guarded(&self, snapshot: &CacheSnapshot<'_>) -> PanelContent {
        guard_render(&self.descriptor.id, &self.descriptor.label, || self.render(snapshot))
    }

    fn overview_rows(&self, snapshot: &CacheSnapshot<'_>) -> Vec<ContentLine> {
        let width = self
            .resources
            .iter()
            .map(|r| r.key.chars().count())
            .max()
            .unwrap_or(0)
            + 2;

        let mut rows = vec![
            ContentLine::new()
                .push(format!("{:<width$}", "RESOURCE", width = width), Tone::Heading)
                .push(format!("{:<10}", "STATUS"), Tone::Heading)
                .push(format!("{:<12}", "UPDATED"), Tone::Heading)
                .push("FAILURES", Tone::Heading),
        ];
        for resource in &self.resources {
            let view = snapshot.view(&resource.key, self.descriptor.refresh_interval);
            rows.push(
                ContentLine::new()
                    .push(format!("{:<width$}", resource.key, width = width), Tone::Normal)
                    .push(format!("{:<10}", view.status.as_str()), status_tone(view.status))
                    .push(
                        format!("{:<12}", view.age.map_or_else(|| "-".to_string(), format_age)),
                        Tone::Muted,
                    )
                    .push(
                        view.failures.to_string(),
                        if view.failures > 0 { Tone::Warning } else { Tone::Muted },
                    ),
            );
        }
        rows
    }
}

/// Run `render`, turning an error or a panic into a "render failed"
/// placeholder so one broken panel cannot take the dashboard down.
pub fn guard_render<F>(panel_id: &str, label: &str, render: F) -> PanelContent
where
    F: FnOnce() -> Result<PanelContent, RenderError>,
{
    let error = match catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(content)) => return content,
        Ok(Err(error)) => error,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            RenderError::Panicked { message }
        }
    };

    warn!(
        event = "core.panel.render_failed",
        panel_id = panel_id,
        error = %error
    );
    PanelContent::render_failed(label, &error.to_string())
}

fn status_tone(status: ResourceStatus) -> Tone {
    match status {
        ResourceStatus::Loading => Tone::Muted,
        ResourceStatus::Fresh => Tone::Good,
        ResourceStatus::Stale => Tone::Stale,
        ResourceStatus::Failing => Tone::Warning,
        ResourceStatus::Offline => Tone::Critical,
    }
}

pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn status_line(view: &ResourceView<'_>) -> ContentLine {
    let line = ContentLine::new().push(format!("{}  ", view.key), Tone::Heading);
    let updated = view
        .age
        .map(|age| format!("  updated {}", format_age(age)))
        .unwrap_or_default();
    let error = view.error.map(ToString::to_string).unwrap_or_default();

    match view.status {
        ResourceStatus::Loading => line.push("loading…", Tone::Muted),
        ResourceStatus::Fresh => line.push("● fresh", Tone::Good).push(updated, Tone::Muted),
        ResourceStatus::Stale => line.push("◌ stale", Tone::Stale).push(updated, Tone::Muted),
        ResourceStatus::Failing => {
            let line = line.push(
                format!("⚠ fetch failed ({}): {}", view.failures, error),
                Tone::Warning,
            );
            if view.value.is_some() {
                line.push(format!("  showing last good data{}", updated), Tone::Muted)
            } else {
                line
            }
        }
        ResourceStatus::Offline => line.push(
            format!("✖ offline after {} failures: {}", view.failures, error),
            Tone::Critical,
        ),
    }
}
