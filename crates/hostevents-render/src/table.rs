//! Aligned text tables for pivot and expanded-event results.

use hostevents_data::expand::ExpandedEvents;
use hostevents_data::pivot::PivotTable;
use unicode_width::UnicodeWidthStr;

// ── TableStyle ────────────────────────────────────────────────────────────────

/// Styling parameters for pivot rendering.
#[derive(Debug, Clone)]
pub struct TableStyle {
    /// Mark the highest count in each row with a trailing `*`.
    pub highlight_max: bool,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self { highlight_max: true }
    }
}

// ── Pivot rendering ───────────────────────────────────────────────────────────

/// Render a pivot as an aligned text table.
///
/// First column is the activity label, then one column per account, then a
/// totals row. With [`TableStyle::highlight_max`] the per-row maximum count
/// (when non-zero) carries a `*` marker.
pub fn render_pivot(pivot: &PivotTable, style: &TableStyle) -> String {
    if pivot.is_empty() {
        return "(no events)\n".to_string();
    }

    let mut header: Vec<String> = vec!["Activity".to_string()];
    header.extend(pivot.accounts.iter().cloned());

    let mut body: Vec<Vec<String>> = Vec::with_capacity(pivot.rows.len() + 1);
    for row in &pivot.rows {
        let row_max = row.counts.iter().copied().max().unwrap_or(0);
        let mut cells = vec![row.activity.clone()];
        for &count in &row.counts {
            let marked = style.highlight_max && row_max > 0 && count == row_max;
            cells.push(if marked {
                format!("{}*", count)
            } else {
                count.to_string()
            });
        }
        body.push(cells);
    }

    // Totals row over all account columns.
    let mut totals = vec!["TOTAL".to_string()];
    for col in 0..pivot.accounts.len() {
        let sum: u64 = pivot.rows.iter().map(|r| r.counts[col]).sum();
        totals.push(sum.to_string());
    }
    body.push(totals);

    layout(&header, &body)
}

// ── Expanded-event rendering ──────────────────────────────────────────────────

/// Render an expanded-event table: core columns plus one column per payload
/// key, truncated to `max_rows` rows.
pub fn render_expanded(expanded: &ExpandedEvents, max_rows: usize) -> String {
    if expanded.is_empty() {
        return "(no events)\n".to_string();
    }

    let mut header: Vec<String> = ["EventID", "TimeGenerated", "Account", "Activity"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(expanded.payload_columns.iter().cloned());

    let mut body: Vec<Vec<String>> = Vec::new();
    for row in expanded.rows.iter().take(max_rows) {
        let mut cells = vec![
            row.record.event_id.to_string(),
            row.record.time_generated.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.record.account.clone(),
            row.record.activity.clone(),
        ];
        for col in &expanded.payload_columns {
            cells.push(row.payload_value(col).to_string());
        }
        body.push(cells);
    }

    let mut out = layout(&header, &body);
    if expanded.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", expanded.len() - max_rows));
    }
    out
}

// ── Layout helpers ────────────────────────────────────────────────────────────

/// Pad and join header + body rows into an aligned table with a separator
/// line under the header.
fn layout(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(header, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row(&rule, &widths));
    for row in body {
        out.push_str(&format_row(row, &widths));
    }
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        // Pad by display width, not byte length.
        let pad = widths[i].saturating_sub(cell.width());
        line.push_str(&" ".repeat(pad));
    }
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────
