use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use monitor_core::KeyInput;

/// Translate a crossterm key event. Releases and unsupported keys map to
/// `None`.
pub fn key_input(event: &KeyEvent) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyInput::Ctrl(c.to_ascii_lowercase())
        }
        KeyCode::Char(c) => KeyInput::Char(c),
        KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => KeyInput::BackTab,
        KeyCode::Tab => KeyInput::Tab,
        KeyCode::BackTab => KeyInput::BackTab,
        KeyCode::Esc => KeyInput::Esc,
        KeyCode::Enter => KeyInput::Enter,
        KeyCode::Up => KeyInput::Up,
        KeyCode::Down => KeyInput::Down,
        KeyCode::PageUp => KeyInput::PageUp,
        KeyCode::PageDown => KeyInput::PageDown,
        KeyCode::Home => KeyInput::Home,
        KeyCode::End => KeyInput::End,
        _ => return None,
    };
    Some(key)
}
