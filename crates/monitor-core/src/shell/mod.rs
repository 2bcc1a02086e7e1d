//! Dashboard chrome: header, tab strip, footer and layout.
//!
//! Everything here is plain state producing [`ContentLine`]s; the terminal
//! host owns drawing and the event loop.

pub mod errors;

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;
use tracing::debug;

use crate::navigation::{KeyBindings, NavigationController};
use crate::panels::{ContentLine, Tone};
use crate::scheduler::RefreshRequest;

pub use errors::DashboardError;

/// How long a footer notice stays up.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Below this width the chrome drops labels and long hints.
pub const COMPACT_WIDTH: u16 = 80;

/// Header, tab strip and footer take one row each.
const CHROME_ROWS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellLayout {
    pub width: u16,
    pub height: u16,
}

impl ShellLayout {
    pub fn compact(&self) -> bool {
        self.width < COMPACT_WIDTH
    }

    pub fn body_height(&self) -> u16 {
        self.height.saturating_sub(CHROME_ROWS)
    }
}

/// Why the active panel is being redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTrigger {
    Activation,
    ManualRefresh,
    FetchCompleted,
    Resize,
    ClockTick,
}

impl RenderTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderTrigger::Activation => "activation",
            RenderTrigger::ManualRefresh => "manual_refresh",
            RenderTrigger::FetchCompleted => "fetch_completed",
            RenderTrigger::Resize => "resize",
            RenderTrigger::ClockTick => "clock_tick",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notice {
    text: String,
    tone: Tone,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    title: String,
    env: String,
    layout: ShellLayout,
    notice: Option<Notice>,
    last_manual_refresh: Option<DateTime<Local>>,
}

impl ShellState {
    pub fn new(title: impl Into<String>, env: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            title: title.into(),
            env: env.into(),
            layout: ShellLayout { width, height },
            notice: None,
            last_manual_refresh: None,
        }
    }

    pub fn layout(&self) -> ShellLayout {
        self.layout
    }

    /// Returns whether the size actually changed.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let layout = ShellLayout { width, height };
        if layout == self.layout {
            return false;
        }
        debug!(event = "core.shell.resized", width = width, height = height);
        self.layout = layout;
        true
    }

    pub fn identity(&self) -> String {
        format!("{} · {}", self.title, self.env)
    }

    pub fn header(&self, now: DateTime<Local>) -> ContentLine {
        let clock = now.format("%H:%M:%S").to_string();
        let identity = self.identity();
        let used = identity.chars().count() + clock.chars().count() + 1;
        let gap = usize::from(self.layout.width).saturating_sub(used).max(1);
        ContentLine::new()
            .push(format!(" {}", identity), Tone::Heading)
            .push(" ".repeat(gap), Tone::Normal)
            .push(clock, Tone::Muted)
    }

    pub fn tabs(&self, nav: &NavigationController) -> ContentLine {
        let active = nav.active_index();
        let compact = self.layout.compact();
        let mut line = ContentLine::new();
        for (i, panel) in nav.panels().iter().enumerate() {
            let text = if compact {
                format!(" {} ", i + 1)
            } else {
                format!(" {} {} ", i + 1, panel.label())
            };
            let tone = if Some(i) == active { Tone::Heading } else { Tone::Muted };
            line = line.push(text, tone);
        }
        line
    }

    pub fn footer(&self, nav: &NavigationController, in_flight: usize, now: Instant) -> ContentLine {
        let bindings = nav.bindings();
        let hints = if self.layout.compact() {
            format!(
                " 1-{} {} {}",
                nav.panels().len(),
                KeyBindings::hint(&bindings.refresh),
                KeyBindings::hint(&bindings.quit)
            )
        } else {
            format!(
                " 1-{} panel  {}/{} cycle  {} refresh  ↑↓ scroll  {} quit",
                nav.panels().len(),
                KeyBindings::hint(&bindings.next),
                KeyBindings::hint(&bindings.previous),
                KeyBindings::hint(&bindings.refresh),
                KeyBindings::hint(&bindings.quit)
            )
        };

        let mut line = ContentLine::new()
            .push(hints, Tone::Muted)
            .push("  │ ", Tone::Muted)
            .push(
                format!("{} fetching", in_flight),
                if in_flight > 0 { Tone::Warning } else { Tone::Muted },
            );
        if let Some(at) = self.last_manual_refresh {
            line = line.push(format!(" · refreshed {}", at.format("%H:%M:%S")), Tone::Muted);
        }
        if let Some(notice) = self.notice.as_ref().filter(|n| n.expires_at > now) {
            line = line.push(format!(" · {}", notice.text), notice.tone);
        }
        line
    }

    pub fn notify(&mut self, text: impl Into<String>, tone: Tone, now: Instant) {
        self.notice = Some(Notice {
            text: text.into(),
            tone,
            expires_at: now + NOTICE_TTL,
        });
    }

    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.expires_at > now)
            .map(|n| n.text.as_str())
    }

    /// Drop an expired notice. Returns true when one was dropped, so the
    /// host knows the footer changed.
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.notice = None;
            return true;
        }
        false
    }

    /// Summarise the outcome of a manual refresh in the footer.
    pub fn record_refresh(
        &mut self,
        results: &[(String, RefreshRequest)],
        wall_clock: DateTime<Local>,
        now: Instant,
    ) {
        let busy: Vec<&str> = results
            .iter()
            .filter(|(_, r)| *r == RefreshRequest::AlreadyRefreshing)
            .map(|(key, _)| key.as_str())
            .collect();
        let dispatched = results
            .iter()
            .filter(|(_, r)| matches!(r, RefreshRequest::Dispatched { .. }))
            .count();

        if dispatched > 0 {
            self.last_manual_refresh = Some(wall_clock);
        }

        if !busy.is_empty() {
            self.notify(format!("already refreshing {}", busy.join(", ")), Tone::Warning, now);
        } else if dispatched > 0 {
            let noun = if dispatched == 1 { "resource" } else { "resources" };
            self.notify(format!("refreshing {} {}", dispatched, noun), Tone::Good, now);
        } else {
            self.notify("nothing to refresh", Tone::Muted, now);
        }
    }
}

/// Whether a finished fetch for `key` should redraw the screen.
pub fn affects_active_panel(nav: &NavigationController, key: &str) -> bool {
    nav.active_panel().is_some_and(|panel| panel.shows_key(key))
}
