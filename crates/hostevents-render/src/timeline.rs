//! Text timeline of account-management events, one lane per event id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hostevents_core::models::{EventRecord, TimeSpan};

/// Number of time buckets per lane.
const BUCKETS: usize = 48;

/// Render events as per-event-id lanes of time buckets across `timespan`.
///
/// Each lane shows bucket occupancy (`.` none, `+` a few, `#` many) with the
/// event count at the end, e.g.:
///
/// ```text
/// 2024-03-01 00:00:00 .. 2024-03-02 00:00:00 UTC
/// 4720 |....#...+.......| 12 events
/// ```
pub fn render_timeline(records: &[EventRecord], timespan: &TimeSpan) -> String {
    if records.is_empty() || timespan.is_empty() {
        return "(no events)\n".to_string();
    }

    let span_secs = (timespan.end - timespan.start).num_seconds().max(1);

    // Bucket counts per event id.
    let mut lanes: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for record in records {
        let lane = lanes.entry(record.event_id).or_insert_with(|| vec![0; BUCKETS]);
        if let Some(bucket) = bucket_index(record.time_generated, timespan, span_secs) {
            lane[bucket] += 1;
        }
    }

    let mut out = format!(
        "{} .. {} UTC\n",
        timespan.start.format("%Y-%m-%d %H:%M:%S"),
        timespan.end.format("%Y-%m-%d %H:%M:%S"),
    );
    for (event_id, buckets) in &lanes {
        let bar: String = buckets
            .iter()
            .map(|&n| match n {
                0 => '.',
                1..=2 => '+',
                _ => '#',
            })
            .collect();
        let total: u32 = buckets.iter().sum();
        out.push_str(&format!("{:>5} |{}| {} events\n", event_id, bar, total));
    }
    out
}

fn bucket_index(ts: DateTime<Utc>, timespan: &TimeSpan, span_secs: i64) -> Option<usize> {
    if !timespan.contains(ts) {
        return None;
    }
    let offset = (ts - timespan.start).num_seconds();
    let idx = (offset * BUCKETS as i64 / span_secs) as usize;
    Some(idx.min(BUCKETS - 1))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
