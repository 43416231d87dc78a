//! Account-identity canonicalization.

/// Sentinel shown for events that carry no usable account.
pub const NO_ACCOUNT: &str = "No Account";

/// The placeholder Windows writes when neither domain nor user is known.
const EMPTY_MARKER: &str = "-\\-";

/// Canonicalize a raw account string for display and pivoting.
///
/// The `-\-` placeholder and the empty string become [`NO_ACCOUNT`]; any
/// other value keeps only the last backslash-separated segment, stripping
/// the domain prefix. Idempotent, and never mutates the source record: the
/// pivot builder works on normalized copies so callers retain the original
/// domain-qualified value.
pub fn normalize_account(account: &str) -> String {
    if account.is_empty() || account == EMPTY_MARKER {
        return NO_ACCOUNT.to_string();
    }
    account
        .rsplit('\\')
        .next()
        .unwrap_or(account)
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
