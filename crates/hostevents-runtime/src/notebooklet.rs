//! The Windows host security events notebooklet.
//!
//! `run` fetches a host's security events for a time range and produces:
//!
//! - a summary pivot of all event activity vs. account,
//! - optionally the account-management subset, its pivot and a timeline,
//! - optionally the fully payload-expanded event table.
//!
//! High-volume process-creation (4688) and logon (4624) events are excluded
//! at query time. The result is stored in a caller-owned [`EventSession`] so
//! the follow-on [`HostEventsNotebooklet::expand_events`] can reuse the raw
//! event set without re-querying.

use hostevents_core::error::{NotebookletError, Result};
use hostevents_core::models::{EventRecord, RunOptions, TimeSpan};
use hostevents_data::expand::{expand_events, ExpandedEvents};
use hostevents_data::filter::filter_account_events;
use hostevents_data::pivot::PivotTable;
use hostevents_data::provider::{QueryProvider, QueryRefinement};
use hostevents_render::table::{render_pivot, TableStyle};
use hostevents_render::timeline::render_timeline;
use tracing::info;

/// Event ids excluded from every fetch: process creation and logon events
/// dominate volume and are covered by other notebooklets.
const EXCLUDED_EVENT_IDS: [u32; 2] = [4688, 4624];

// ── HostEventsResult ──────────────────────────────────────────────────────────

/// Everything a notebooklet run produced.
#[derive(Debug, Clone)]
pub struct HostEventsResult {
    /// All raw events retrieved for the host.
    pub all_events: Vec<EventRecord>,
    /// Activity × Account pivot over all events.
    pub event_pivot: PivotTable,
    /// Rendered pivot, present when `emit_pivot_display` was set.
    pub pivot_display: Option<String>,
    /// Account-management subset, when `include_account_events` was set.
    pub account_events: Option<Vec<EventRecord>>,
    /// Pivot of the account-management subset.
    pub account_pivot: Option<PivotTable>,
    /// Rendered account pivot, when `emit_pivot_display` was also set.
    pub account_pivot_display: Option<String>,
    /// Text timeline of account-management events grouped by event id.
    pub account_timeline: Option<String>,
    /// Fully expanded payload table, when `expand_payloads` was set.
    pub expanded_events: Option<ExpandedEvents>,
}

// ── EventSession ──────────────────────────────────────────────────────────────

/// Caller-owned session state: either "not yet run" or "has a last result".
#[derive(Debug, Clone, Default)]
pub struct EventSession {
    last: Option<HostEventsResult>,
}

impl EventSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent successful result, if any.
    pub fn last_result(&self) -> Option<&HostEventsResult> {
        self.last.as_ref()
    }
}

// ── HostEventsNotebooklet ─────────────────────────────────────────────────────

/// Orchestrates the host security events pipeline over a query provider.
pub struct HostEventsNotebooklet<P: QueryProvider> {
    provider: P,
}

impl<P: QueryProvider> HostEventsNotebooklet<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Run the notebooklet for `host` over `timespan`.
    ///
    /// Fails with [`NotebookletError::MissingParameter`] before any work is
    /// performed when the host is empty or the timespan selects nothing.
    /// On success the result is stored in `session` and returned.
    pub fn run(
        &self,
        session: &mut EventSession,
        host: &str,
        timespan: &TimeSpan,
        options: &RunOptions,
    ) -> Result<HostEventsResult> {
        if host.trim().is_empty() {
            return Err(NotebookletError::missing("host"));
        }
        if timespan.is_empty() {
            return Err(NotebookletError::missing("timespan"));
        }

        info!("Getting SecurityEvent data for {}...", host);
        let all_events = self.provider.query_host_events(
            timespan,
            host,
            &QueryRefinement::excluding(&EXCLUDED_EVENT_IDS),
        )?;
        info!("{} events retrieved", all_events.len());

        let event_pivot = PivotTable::build(&all_events);
        let pivot_display = options
            .emit_pivot_display
            .then(|| render_pivot(&event_pivot, &TableStyle::default()));

        let mut account_events = None;
        let mut account_pivot = None;
        let mut account_pivot_display = None;
        let mut account_timeline = None;
        if options.include_account_events {
            let subset = filter_account_events(&all_events);
            let pivot = PivotTable::build(&subset);
            if options.emit_pivot_display {
                account_pivot_display = Some(render_pivot(&pivot, &TableStyle::default()));
            }
            account_timeline = Some(render_timeline(&subset, timespan));
            account_events = Some(subset);
            account_pivot = Some(pivot);
        }

        let expanded_events = options
            .expand_payloads
            .then(|| expand_events(&all_events, None));

        info!("To unpack event data from selected events use expand_events()");

        let result = HostEventsResult {
            all_events,
            event_pivot,
            pivot_display,
            account_events,
            account_pivot,
            account_pivot_display,
            account_timeline,
            expanded_events,
        };
        session.last = Some(result.clone());
        Ok(result)
    }

    /// Expand `EventData` payloads from the session's last result, optionally
    /// restricted to `event_ids`.
    ///
    /// Requires a prior successful [`HostEventsNotebooklet::run`]; otherwise
    /// a guidance message is emitted and `None` is returned.
    pub fn expand_events(
        &self,
        session: &EventSession,
        event_ids: Option<&[u32]>,
    ) -> Option<ExpandedEvents> {
        let last = match session.last_result() {
            Some(last) => last,
            None => {
                info!("Please use 'run' to fetch the data before calling 'expand_events'");
                return None;
            }
        };
        Some(expand_events(&last.all_events, event_ids))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
