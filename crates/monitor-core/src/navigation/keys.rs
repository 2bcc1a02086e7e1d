//! Terminal-independent key names and the bindings built from `[keys]`.

use std::fmt;

use crate::config::KeyConfig;
use crate::errors::ConfigError;

/// A key press, independent of the terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    Char(char),
    Ctrl(char),
    Tab,
    BackTab,
    Esc,
    Enter,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

impl KeyInput {
    /// Parse a config key name such as `q`, `esc`, `ctrl-c` or `shift-tab`.
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "tab" => KeyInput::Tab,
            "shift-tab" | "backtab" => KeyInput::BackTab,
            "esc" | "escape" => KeyInput::Esc,
            "enter" | "return" => KeyInput::Enter,
            "up" => KeyInput::Up,
            "down" => KeyInput::Down,
            "pageup" | "page-up" => KeyInput::PageUp,
            "pagedown" | "page-down" => KeyInput::PageDown,
            "home" => KeyInput::Home,
            "end" => KeyInput::End,
            "space" => KeyInput::Char(' '),
            other => {
                if let Some(rest) = other.strip_prefix("ctrl-") {
                    let mut chars = rest.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if c.is_ascii_alphanumeric() => KeyInput::Ctrl(c),
                        _ => return None,
                    }
                } else {
                    // Single characters keep their case: `R` and `r` differ.
                    let mut chars = name.trim().chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) if !c.is_control() => KeyInput::Char(c),
                        _ => return None,
                    }
                }
            }
        };
        Some(key)
    }

    /// Digit keys select panels by position (1-based).
    pub fn digit(&self) -> Option<usize> {
        match self {
            KeyInput::Char(c) => c.to_digit(10).map(|d| d as usize),
            _ => None,
        }
    }
}

impl fmt::Display for KeyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyInput::Char(' ') => write!(f, "space"),
            KeyInput::Char(c) => write!(f, "{}", c),
            KeyInput::Ctrl(c) => write!(f, "ctrl-{}", c),
            KeyInput::Tab => write!(f, "tab"),
            KeyInput::BackTab => write!(f, "shift-tab"),
            KeyInput::Esc => write!(f, "esc"),
            KeyInput::Enter => write!(f, "enter"),
            KeyInput::Up => write!(f, "up"),
            KeyInput::Down => write!(f, "down"),
            KeyInput::PageUp => write!(f, "pageup"),
            KeyInput::PageDown => write!(f, "pagedown"),
            KeyInput::Home => write!(f, "home"),
            KeyInput::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub quit: Vec<KeyInput>,
    pub refresh: Vec<KeyInput>,
    pub next: Vec<KeyInput>,
    pub previous: Vec<KeyInput>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: vec![KeyInput::Char('q'), KeyInput::Esc, KeyInput::Ctrl('c')],
            refresh: vec![KeyInput::Char('r')],
            next: vec![KeyInput::Tab],
            previous: vec![KeyInput::BackTab],
        }
    }
}

fn parse_list(action: &str, names: &[String]) -> Result<Vec<KeyInput>, ConfigError> {
    names
        .iter()
        .map(|name| {
            KeyInput::parse(name).ok_or_else(|| ConfigError::UnknownKey {
                action: action.to_string(),
                key: name.clone(),
            })
        })
        .collect()
}

impl KeyBindings {
    /// Defaults, with each action configured in `[keys]` replaced wholesale.
    /// `ctrl-c` always quits so a bad config cannot trap the user.
    pub fn from_config(config: &KeyConfig) -> Result<Self, ConfigError> {
        let mut bindings = Self::default();
        if let Some(quit) = &config.quit {
            bindings.quit = parse_list("quit", quit)?;
            if !bindings.quit.contains(&KeyInput::Ctrl('c')) {
                bindings.quit.push(KeyInput::Ctrl('c'));
            }
        }
        if let Some(refresh) = &config.refresh {
            bindings.refresh = parse_list("refresh", refresh)?;
        }
        if let Some(next) = &config.next {
            bindings.next = parse_list("next", next)?;
        }
        if let Some(previous) = &config.previous {
            bindings.previous = parse_list("previous", previous)?;
        }
        Ok(bindings)
    }

    /// `"q/esc/ctrl-c"`, for the footer.
    pub fn hint(keys: &[KeyInput]) -> String {
        keys.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}
