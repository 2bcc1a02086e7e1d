use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn directive(quiet: bool) -> &'static str {
    if quiet { "monitor=error" } else { "monitor=info" }
}

fn env_filter(quiet: bool) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(
        directive(quiet)
            .parse()
            .expect("static log directive is valid"),
    )
}

/// Initialize logging with optional quiet mode.
///
/// When `quiet` is true, only error-level events are emitted.
/// When `quiet` is false, info-level and above events are emitted.
pub fn init_logging(quiet: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(env_filter(quiet))
        .init();
}

/// Initialize logging into an append-only file.
///
/// Used while the dashboard owns the terminal: anything written to stderr
/// would be drawn over the alternate screen.
pub fn init_file_logging(quiet: bool, path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(env_filter(quiet))
        .init();

    Ok(())
}

/// Default dashboard log location: `~/.monitor/logs/dashboard.log`.
pub fn default_log_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".monitor").join("logs").join("dashboard.log"))
}
