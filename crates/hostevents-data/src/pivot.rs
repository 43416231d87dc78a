//! Activity × Account cross-tabulation.

use std::collections::BTreeMap;

use hostevents_core::models::EventRecord;

use crate::normalize::normalize_account;

// ── PivotRow ──────────────────────────────────────────────────────────────────

/// One row of the pivot: an activity label plus a count per account column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    /// The distinct activity label this row counts.
    pub activity: String,
    /// Counts aligned with [`PivotTable::accounts`]. Missing combinations
    /// are 0, not absent.
    pub counts: Vec<u64>,
}

// ── PivotTable ────────────────────────────────────────────────────────────────

/// Count matrix of distinct activity labels vs. normalized account names.
///
/// Rows and columns are exactly the distinct values observed in the input,
/// in sorted order (callers should not rely on any particular ordering
/// beyond determinism).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    /// Distinct normalized account names, one per column.
    pub accounts: Vec<String>,
    /// One row per distinct activity label.
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Build the pivot from `records`, normalizing each account on a copy so
    /// the source records keep their original values.
    ///
    /// Single pass over the input plus a materialization over the distinct
    /// (activity, account) grid.
    pub fn build(records: &[EventRecord]) -> Self {
        let mut grid: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        let mut accounts: BTreeMap<String, ()> = BTreeMap::new();

        for record in records {
            let account = normalize_account(&record.account);
            accounts.entry(account.clone()).or_insert(());
            *grid
                .entry(record.activity.clone())
                .or_default()
                .entry(account)
                .or_insert(0) += 1;
        }

        let accounts: Vec<String> = accounts.into_keys().collect();
        let rows = grid
            .into_iter()
            .map(|(activity, cells)| PivotRow {
                counts: accounts
                    .iter()
                    .map(|a| cells.get(a).copied().unwrap_or(0))
                    .collect(),
                activity,
            })
            .collect();

        Self { accounts, rows }
    }

    /// Count for a specific (activity, account) pair; `None` when either
    /// label was never observed.
    pub fn count(&self, activity: &str, account: &str) -> Option<u64> {
        let col = self.accounts.iter().position(|a| a == account)?;
        self.rows
            .iter()
            .find(|r| r.activity == activity)
            .map(|r| r.counts[col])
    }

    /// Sum of every cell. Equals the number of input records.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.counts.iter().sum::<u64>()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
