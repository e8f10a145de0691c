//! Shared error-message formatting and log setup.

use tracing_subscriber::EnvFilter;

/// Prefix used on every user-facing error line.
const PREFIX: &str = "azmon-dashboards";

/// Normalize an error message to a single prefixed line.
///
/// Multi-line messages (e.g. serde_json errors quoting input) are folded so
/// the final `Error:` line printed by `main` stays greppable.
pub fn error_message(msg: impl AsRef<str>) -> String {
    let folded = msg
        .as_ref()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}: {}", PREFIX, folded)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Logs go to stderr; stdout carries
/// the generated dashboard when no output file is given.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
