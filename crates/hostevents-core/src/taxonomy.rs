//! Static Windows security-event taxonomy.
//!
//! A read-only reference table mapping event identifiers to their audit
//! subcategory and description, bundled as a JSON resource and loaded once
//! per process. Used to derive the set of "account management" style events
//! worth surfacing in the notebooklet summary.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::Deserialize;

/// Event id of a service being installed (System log, not in the security
/// audit taxonomy). Always included in the account-management set.
pub const SERVICE_INSTALL_EVENT_ID: u32 = 7045;

const TAXONOMY_JSON: &str = include_str!("../resources/win_security_events.json");

// ── TaxonomyEntry ─────────────────────────────────────────────────────────────

/// One row of the bundled taxonomy table.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEntry {
    /// Windows event identifier.
    pub event_id: u32,
    /// Audit subcategory, e.g. `"User Account Management"`.
    pub subcategory: String,
    /// Event description text.
    pub description: String,
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// The full taxonomy table, loaded on first access and never mutated.
pub fn entries() -> &'static [TaxonomyEntry] {
    static TABLE: OnceLock<Vec<TaxonomyEntry>> = OnceLock::new();
    TABLE.get_or_init(|| {
        // The resource is compiled in, so a parse failure is a packaging bug.
        serde_json::from_str(TAXONOMY_JSON).unwrap_or_else(|e| {
            tracing::error!("bundled taxonomy resource is invalid: {}", e);
            Vec::new()
        })
    })
}

/// Look up a single taxonomy entry by event id.
pub fn lookup(event_id: u32) -> Option<&'static TaxonomyEntry> {
    entries().iter().find(|e| e.event_id == event_id)
}

/// Event ids considered "account management" activity.
///
/// Covers user-account and security-group management plus scheduled-task
/// object-access events, with the service-install id appended.
pub fn account_management_ids() -> &'static BTreeSet<u32> {
    static IDS: OnceLock<BTreeSet<u32>> = OnceLock::new();
    IDS.get_or_init(|| {
        let mut ids: BTreeSet<u32> = entries()
            .iter()
            .filter(|e| {
                e.subcategory == "User Account Management"
                    || e.subcategory == "Security Group Management"
                    || (e.subcategory == "Other Object Access Events"
                        && e.description.contains("scheduled task"))
            })
            .map(|e| e.event_id)
            .collect();
        ids.insert(SERVICE_INSTALL_EVENT_ID);
        ids
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
