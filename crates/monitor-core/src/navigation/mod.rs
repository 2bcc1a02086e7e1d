//! Panel registry and active-panel state machine.
//!
//! Navigation only ever changes which panel is shown. It asks the host to
//! re-render from cache or to force a refresh; it never fetches.

pub mod keys;

use tracing::{info, warn};

use crate::panels::Panel;

pub use keys::{KeyBindings, KeyInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    Uninitialized,
    Active(String),
}

/// What the host should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Re-render the active panel from cache.
    Render,
    /// Force-refresh these resource keys, then re-render.
    Refresh(Vec<String>),
    Quit,
}

pub struct NavigationController {
    panels: Vec<Panel>,
    state: NavigationState,
    bindings: KeyBindings,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl NavigationController {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            panels: Vec::new(),
            state: NavigationState::Uninitialized,
            bindings,
        }
    }

    /// Add a panel, or replace the one with the same id in place.
    ///
    /// Never changes which panel is active. Replacing the active panel
    /// activates its replacement.
    pub fn register(&mut self, mut panel: Panel) {
        let id = panel.id().to_string();
        match self.panels.iter().position(|p| p.id() == id) {
            Some(index) => {
                if self.is_active(&id) {
                    panel.on_activate();
                }
                self.panels[index] = panel;
                info!(event = "core.navigation.panel_replaced", panel_id = id.as_str());
            }
            None => {
                self.panels.push(panel);
                info!(
                    event = "core.navigation.panel_registered",
                    panel_id = id.as_str(),
                    position = self.panels.len()
                );
            }
        }
    }

    /// Activate the first registered panel. No-op with no panels or when
    /// already initialized.
    pub fn init(&mut self) {
        if self.state != NavigationState::Uninitialized {
            return;
        }
        if let Some(first) = self.panels.first_mut() {
            first.on_activate();
            self.state = NavigationState::Active(first.id().to_string());
            info!(event = "core.navigation.initialized", panel_id = first.id());
        }
    }

    /// Switch to the panel with `id`. Returns false, leaving state unchanged,
    /// for an unknown id.
    pub fn activate(&mut self, id: &str) -> bool {
        let Some(index) = self.panels.iter().position(|p| p.id() == id) else {
            warn!(
                event = "core.navigation.unknown_panel",
                panel_id = id,
                registered = self.panels.len()
            );
            return false;
        };

        if self.is_active(id) {
            return true;
        }

        if let Some(current) = self.active_panel_mut() {
            current.on_deactivate();
        }
        self.panels[index].on_activate();
        self.state = NavigationState::Active(id.to_string());
        info!(event = "core.navigation.panel_activated", panel_id = id);
        true
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn previous(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let len = self.panels.len();
        if len == 0 {
            return false;
        }
        let target = match self.active_index() {
            Some(index) => (index as isize + delta).rem_euclid(len as isize) as usize,
            None => 0,
        };
        let id = self.panels[target].id().to_string();
        self.activate(&id)
    }

    /// Activate the panel at 1-based `position`.
    pub fn select_position(&mut self, position: usize) -> bool {
        let Some(panel) = position.checked_sub(1).and_then(|i| self.panels.get(i)) else {
            return false;
        };
        let id = panel.id().to_string();
        self.activate(&id)
    }

    pub fn dispatch(&mut self, key: KeyInput) -> Action {
        if self.bindings.quit.contains(&key) {
            return Action::Quit;
        }
        if self.bindings.refresh.contains(&key) {
            return match self.active_panel() {
                Some(panel) => Action::Refresh(panel.resource_keys()),
                None => Action::None,
            };
        }
        if self.bindings.next.contains(&key) {
            return render_if(self.next());
        }
        if self.bindings.previous.contains(&key) {
            return render_if(self.previous());
        }
        if let Some(position) = key.digit() {
            return render_if(self.select_position(position));
        }

        let delta = match key {
            KeyInput::Up => -1,
            KeyInput::Down => 1,
            KeyInput::PageUp => -10,
            KeyInput::PageDown => 10,
            KeyInput::Home => i32::MIN,
            KeyInput::End => i32::MAX,
            _ => return Action::None,
        };
        match self.active_panel_mut() {
            Some(panel) => {
                panel.scroll_by(delta);
                Action::Render
            }
            None => Action::None,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn active_id(&self) -> Option<&str> {
        match &self.state {
            NavigationState::Active(id) => Some(id.as_str()),
            NavigationState::Uninitialized => None,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.active_id()?;
        self.panels.iter().position(|p| p.id() == id)
    }

    pub fn active_panel(&self) -> Option<&Panel> {
        self.active_index().map(|i| &self.panels[i])
    }

    pub fn active_panel_mut(&mut self) -> Option<&mut Panel> {
        self.active_index().map(|i| &mut self.panels[i])
    }

    fn is_active(&self, id: &str) -> bool {
        self.active_id() == Some(id)
    }
}

fn render_if(changed: bool) -> Action {
    if changed { Action::Render } else { Action::None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelKind;
    use crate::panels::{PanelDescriptor, PanelResource};
    use std::time::Duration;

    fn panel(id: &str, label: &str) -> Panel {
        Panel::new(
            PanelDescriptor {
                id: id.to_string(),
                label: label.to_string(),
                refresh_interval: Duration::from_secs(10),
                description: None,
            },
            PanelKind::Containers,
            vec![PanelResource {
                name: id.to_string(),
                key: format!("{}:prod", id),
            }],
        )
    }

    fn controller() -> NavigationController {
        let mut nav = NavigationController::default();
        for id in ["services", "containers", "deploy"] {
            nav.register(panel(id, id));
        }
        nav
    }

    #[test]
    fn test_uninitialized_until_init() {
        let mut nav = controller();
        assert_eq!(nav.state(), &NavigationState::Uninitialized);
        assert!(nav.active_panel().is_none());

        nav.init();
        assert_eq!(nav.state(), &NavigationState::Active("services".to_string()));
        assert!(nav.active_panel().unwrap().is_active());
    }

    #[test]
    fn test_init_without_panels_is_noop() {
        let mut nav = NavigationController::default();
        nav.init();
        assert_eq!(nav.state(), &NavigationState::Uninitialized);
        assert_eq!(nav.dispatch(KeyInput::Tab), Action::None);
    }

    #[test]
    fn test_activate_unknown_leaves_state() {
        let mut nav = controller();
        nav.init();
        assert!(!nav.activate("nonexistent"));
        assert_eq!(nav.active_id(), Some("services"));
    }

    #[test]
    fn test_activate_switches_active_flags() {
        let mut nav = controller();
        nav.init();
        assert!(nav.activate("deploy"));
        assert!(!nav.panels()[0].is_active());
        assert!(nav.panels()[2].is_active());
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut nav = controller();
        nav.init();
        nav.previous();
        assert_eq!(nav.active_id(), Some("deploy"));
        nav.next();
        assert_eq!(nav.active_id(), Some("services"));
        nav.next();
        nav.next();
        nav.next();
        assert_eq!(nav.active_id(), Some("services"));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut nav = controller();
        nav.init();
        nav.register(panel("services", "Service Health"));
        assert_eq!(nav.panels().len(), 3);
        assert_eq!(nav.panels()[0].label(), "Service Health");
        assert!(nav.panels()[0].is_active());
        assert_eq!(nav.active_id(), Some("services"));
    }

    #[test]
    fn test_dispatch_digits_select_by_position() {
        let mut nav = controller();
        nav.init();
        assert_eq!(nav.dispatch(KeyInput::Char('3')), Action::Render);
        assert_eq!(nav.active_id(), Some("deploy"));
        assert_eq!(nav.dispatch(KeyInput::Char('9')), Action::None);
        assert_eq!(nav.dispatch(KeyInput::Char('0')), Action::None);
        assert_eq!(nav.active_id(), Some("deploy"));
    }

    #[test]
    fn test_dispatch_refresh_targets_active_panel() {
        let mut nav = controller();
        nav.init();
        nav.dispatch(KeyInput::Tab);
        assert_eq!(
            nav.dispatch(KeyInput::Char('r')),
            Action::Refresh(vec!["containers:prod".to_string()])
        );
    }

    #[test]
    fn test_dispatch_quit_keys() {
        let mut nav = controller();
        for key in [KeyInput::Char('q'), KeyInput::Esc, KeyInput::Ctrl('c')] {
            assert_eq!(nav.dispatch(key), Action::Quit);
        }
        assert_eq!(nav.dispatch(KeyInput::Char('z')), Action::None);
    }

    #[test]
    fn test_dispatch_scroll() {
        let mut nav = controller();
        nav.init();
        assert_eq!(nav.dispatch(KeyInput::PageDown), Action::Render);
        assert_eq!(nav.active_panel().unwrap().scroll(), 10);
        nav.dispatch(KeyInput::Home);
        assert_eq!(nav.active_panel().unwrap().scroll(), 0);
    }
}
