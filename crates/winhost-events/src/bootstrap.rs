use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use hostevents_core::error::{NotebookletError, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(log_level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Attempt to locate the event-export directory on the local system.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `~/.winhost-events/exports/`
/// 2. `~/.local/share/winhost-events/exports/`
///
/// Returns `None` when neither path exists.
pub fn discover_data_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let candidates = [
        home.join(".winhost-events").join("exports"),
        home.join(".local")
            .join("share")
            .join("winhost-events")
            .join("exports"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

// ── Timestamp parsing ──────────────────────────────────────────────────────────

/// Parse a user-supplied timestamp string into a UTC instant.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00Z`) and the naive forms
/// `%Y-%m-%dT%H:%M:%S` / `%Y-%m-%d %H:%M:%S`, interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(NotebookletError::TimestampParse(value.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
