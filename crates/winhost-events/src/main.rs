mod bootstrap;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use hostevents_core::models::{RunOptions, TimeSpan};
use hostevents_data::provider::JsonlEventProvider;
use hostevents_render::table::render_expanded;
use hostevents_runtime::notebooklet::{EventSession, HostEventsNotebooklet};

/// Summarise Windows security events for a host from exported event logs.
#[derive(Debug, Parser)]
#[command(name = "winhost-events", version)]
struct Cli {
    /// Host name to query events for.
    #[arg(long)]
    host: String,

    /// Start of the query time range (RFC 3339 or `YYYY-MM-DDTHH:MM:SS`).
    #[arg(long)]
    start: String,

    /// End of the query time range.
    #[arg(long)]
    end: String,

    /// Directory containing `.jsonl` event exports. Defaults to the first
    /// discovered standard location.
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Skip the account-management subset, pivot and timeline.
    #[arg(long)]
    no_account_events: bool,

    /// Expand every event's XML payload into columns (can be expensive).
    #[arg(long)]
    expand: bool,

    /// Comma-separated event ids for a follow-on restricted expansion,
    /// e.g. `4720,4732`.
    #[arg(long)]
    expand_ids: Option<String>,

    /// Do not print the pivot tables.
    #[arg(long)]
    no_pivot_display: bool,

    /// Maximum rows to print for expanded tables.
    #[arg(long, default_value_t = 50)]
    max_rows: usize,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bootstrap::setup_logging(&cli.log_level)?;

    tracing::info!("winhost-events v{} starting", env!("CARGO_PKG_VERSION"));

    let data_path = match cli.data_path.clone().or_else(bootstrap::discover_data_path) {
        Some(p) => p,
        None => bail!("no event-export directory found; pass --data-path"),
    };

    let timespan = TimeSpan::new(
        bootstrap::parse_timestamp(&cli.start)?,
        bootstrap::parse_timestamp(&cli.end)?,
    );

    let provider = JsonlEventProvider::new(&data_path)
        .with_context(|| format!("opening event exports under {}", data_path.display()))?;
    let notebooklet = HostEventsNotebooklet::new(provider);
    let mut session = EventSession::new();

    let options = RunOptions {
        include_account_events: !cli.no_account_events,
        expand_payloads: cli.expand,
        emit_pivot_display: !cli.no_pivot_display,
    };

    let result = notebooklet.run(&mut session, &cli.host, &timespan, &options)?;

    if let Some(display) = &result.pivot_display {
        println!("Summary of security events on {}\n", cli.host);
        println!("{}", display);
    }
    if let Some(display) = &result.account_pivot_display {
        println!("Account management events\n");
        println!("{}", display);
    }
    if let Some(timeline) = &result.account_timeline {
        println!("Account management timeline\n");
        println!("{}", timeline);
    }
    if let Some(expanded) = &result.expanded_events {
        println!("Expanded event data\n");
        println!("{}", render_expanded(expanded, cli.max_rows));
    }

    // Follow-on expansion restricted to specific event ids.
    if let Some(ids_arg) = &cli.expand_ids {
        let ids = parse_id_list(ids_arg)?;
        if let Some(expanded) = notebooklet.expand_events(&session, Some(&ids)) {
            println!("Expanded event data for {:?}\n", ids);
            println!("{}", render_expanded(&expanded, cli.max_rows));
        }
    }

    Ok(())
}

/// Parse a comma-separated event-id list like `4720,4732`.
fn parse_id_list(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid event id: {}", s))
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
