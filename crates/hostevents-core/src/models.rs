use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── EventRecord ───────────────────────────────────────────────────────────────

/// One row of a Windows security event log.
///
/// The named fields are the columns every query provider must supply; any
/// further columns in the source data (for example a pre-seeded
/// `TargetUserName` column) land in [`EventRecord::extra`] via serde
/// flattening and take part in payload absorption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Windows event identifier, e.g. `4720`.
    #[serde(rename = "EventID")]
    pub event_id: u32,
    /// Human-readable activity label, e.g. `"A user account was created"`.
    #[serde(rename = "Activity", default)]
    pub activity: String,
    /// Raw account identity, possibly empty or domain-qualified
    /// (`"DOMAIN\\alice"`).
    #[serde(rename = "Account", default)]
    pub account: String,
    /// Host the event was recorded on.
    #[serde(rename = "Computer", default)]
    pub computer: String,
    /// UTC timestamp when the event was generated.
    #[serde(rename = "TimeGenerated")]
    pub time_generated: DateTime<Utc>,
    /// Raw XML-encoded event payload, if present.
    #[serde(rename = "EventData", default)]
    pub event_data: Option<String>,
    /// Any additional columns supplied by the provider.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

// ── TimeSpan ──────────────────────────────────────────────────────────────────

/// A half-open UTC time range: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `ts` falls inside the span.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// A span that selects nothing (`start >= end`).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

// ── RunOptions ────────────────────────────────────────────────────────────────

/// Configuration for a notebooklet run.
///
/// Each flag is independently settable; the defaults reproduce the standard
/// run (event pivot displayed, account-management events summarised, payload
/// expansion off because it can be expensive on large event sets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute the account-management subset, its pivot and its timeline.
    pub include_account_events: bool,
    /// Expand every event's XML payload into flat columns. Prefer the
    /// follow-on expansion restricted by event id on large result sets.
    pub expand_payloads: bool,
    /// Attach rendered table/timeline strings to the result for display.
    pub emit_pivot_display: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_account_events: true,
            expand_payloads: false,
            emit_pivot_display: true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
