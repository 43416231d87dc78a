//! Taxonomy-driven event filtering.

use hostevents_core::models::EventRecord;
use hostevents_core::taxonomy;
use tracing::debug;

/// Select the account-management style events from `records`.
///
/// Keeps every record whose event id is in
/// [`taxonomy::account_management_ids`] (user-account and security-group
/// management, scheduled-task object access, service install). The filter is
/// stable: output rows keep their input order.
pub fn filter_account_events(records: &[EventRecord]) -> Vec<EventRecord> {
    let ids = taxonomy::account_management_ids();
    let kept: Vec<EventRecord> = records
        .iter()
        .filter(|r| ids.contains(&r.event_id))
        .cloned()
        .collect();
    debug!(
        "account-management filter kept {} of {} events",
        kept.len(),
        records.len()
    );
    kept
}

/// Restrict `records` to the given event ids, preserving input order.
pub fn filter_by_event_ids(records: &[EventRecord], event_ids: &[u32]) -> Vec<EventRecord> {
    records
        .iter()
        .filter(|r| event_ids.contains(&r.event_id))
        .cloned()
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
