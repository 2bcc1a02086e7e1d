//! Terminal setup and teardown.

use std::io::{self, IsTerminal, Stdout};
use std::sync::Mutex;

use crossterm::ExecutableCommand;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, warn};

use monitor_core::DashboardError;

pub type DashboardTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Latest panic seen while the alternate screen was up. Printed after
/// restore if the guard is dropped by unwinding.
static PENDING_PANIC: Mutex<Option<String>> = Mutex::new(None);

/// Owns the terminal while the dashboard runs.
///
/// Raw mode and the alternate screen are undone on drop, so every exit path
/// (quit, error, panic unwinding through the event loop) restores the shell.
pub struct TerminalGuard {
    terminal: DashboardTerminal,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self, DashboardError> {
        if !io::stdout().is_terminal() {
            return Err(DashboardError::TerminalInit {
                message: "stdout is not a terminal".to_string(),
            });
        }

        enable_raw_mode().map_err(init_error)?;
        let mut stdout = io::stdout();
        if let Err(e) = stdout.execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(init_error(e));
        }

        // Panic messages would be drawn over the alternate screen
        std::panic::set_hook(Box::new(|info| {
            error!(event = "cli.dashboard.panic", panic = %info);
            record_panic(info.to_string());
        }));

        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                restore();
                return Err(init_error(e));
            }
        };
        let mut guard = Self { terminal };
        guard.terminal.clear()?;

        Ok(guard)
    }

    pub fn terminal(&mut self) -> &mut DashboardTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        if let Err(e) = self.terminal.show_cursor() {
            warn!(event = "cli.dashboard.show_cursor_failed", error = %e);
        }
        // Panics caught inside panel rendering were already shown in place
        let pending = take_panic();
        if std::thread::panicking() {
            if let Some(message) = pending {
                eprintln!("Error: dashboard crashed: {}", message);
            }
        }
    }
}

fn restore() {
    let _ = std::panic::take_hook();
    if let Err(e) = disable_raw_mode() {
        warn!(event = "cli.dashboard.raw_mode_restore_failed", error = %e);
    }
    if let Err(e) = io::stdout().execute(LeaveAlternateScreen) {
        warn!(event = "cli.dashboard.alternate_screen_restore_failed", error = %e);
    }
}

fn record_panic(message: String) {
    if let Ok(mut pending) = PENDING_PANIC.lock() {
        *pending = Some(message);
    }
}

fn take_panic() -> Option<String> {
    PENDING_PANIC.lock().ok().and_then(|mut pending| pending.take())
}

fn init_error(e: io::Error) -> DashboardError {
    DashboardError::TerminalInit {
        message: e.to_string(),
    }
}
