//! XML `EventData` payload expansion.
//!
//! Windows security events carry an XML payload of `<Data Name="...">value`
//! pairs whose keys differ per event id. Expansion parses each row's payload,
//! absorbs values into existing empty columns, then explodes the residual
//! keys into one sparse column set across the whole batch.
//!
//! This is the expensive part of the pipeline: O(rows × payload size) plus a
//! column merge over every distinct key. Callers working on large event sets
//! should restrict by event id first.

use std::collections::{BTreeMap, BTreeSet};

use hostevents_core::models::EventRecord;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use tracing::debug;

use crate::filter::filter_by_event_ids;

/// Column names every record carries regardless of provider.
const CORE_COLUMNS: [&str; 6] = [
    "EventID",
    "Activity",
    "Account",
    "Computer",
    "TimeGenerated",
    "EventData",
];

// ── Payload parsing ───────────────────────────────────────────────────────────

/// Parse an `EventData` payload into a key → value mapping.
///
/// Collects every `Data` element's `Name` attribute and text content,
/// tolerating namespace prefixes and self-closing elements. Returns `None`
/// for malformed XML or a payload with no element at all; a bad payload
/// marks only its own row and never aborts the batch.
pub fn parse_payload(xml: &str) -> Option<BTreeMap<String, String>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    let mut saw_element = false;
    // Name attribute of the currently open Data element, if any.
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => {
                saw_element = true;
                if e.local_name().as_ref() == b"Data" {
                    current = data_name(&e);
                    if let Some(name) = &current {
                        map.entry(name.clone()).or_default();
                    }
                } else {
                    current = None;
                }
            }
            Ok(XmlEvent::Empty(e)) => {
                saw_element = true;
                if e.local_name().as_ref() == b"Data" {
                    if let Some(name) = data_name(&e) {
                        map.entry(name).or_default();
                    }
                }
            }
            Ok(XmlEvent::Text(t)) => {
                if let Some(name) = &current {
                    let value = t.unescape().ok()?;
                    map.insert(name.clone(), value.into_owned());
                }
            }
            Ok(XmlEvent::End(_)) => current = None,
            Ok(XmlEvent::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    // Plain text like "-" parses without error but is not a payload.
    if !saw_element {
        return None;
    }
    Some(map)
}

/// Extract the `Name` attribute from a `Data` element.
fn data_name(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"Name" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

// ── Absorption ────────────────────────────────────────────────────────────────

/// Merge a parsed payload into a record.
///
/// Payload keys matching a column that already exists on the record with an
/// empty value overwrite that column and are removed from the returned
/// residual mapping. Keys whose column holds a non-empty value are left in
/// the residual untouched.
pub fn absorb_payload(
    record: &EventRecord,
    payload: BTreeMap<String, String>,
) -> (EventRecord, BTreeMap<String, String>) {
    let mut updated = record.clone();
    let mut residual = BTreeMap::new();

    for (key, value) in payload {
        let absorbed = match key.as_str() {
            "Account" if updated.account.is_empty() => {
                updated.account = value.clone();
                true
            }
            "Activity" if updated.activity.is_empty() => {
                updated.activity = value.clone();
                true
            }
            "Computer" if updated.computer.is_empty() => {
                updated.computer = value.clone();
                true
            }
            _ => match updated.extra.get_mut(&key) {
                Some(existing) if existing.is_empty() => {
                    *existing = value.clone();
                    true
                }
                _ => false,
            },
        };

        if absorbed {
            debug!(event_id = record.event_id, column = %key, "absorbed payload value into empty column");
        } else {
            residual.insert(key, value);
        }
    }

    (updated, residual)
}

// ── ExpandedEvents ────────────────────────────────────────────────────────────

/// One record plus its residual payload values.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedEvent {
    /// The (possibly payload-updated) source record.
    pub record: EventRecord,
    /// Residual payload values, keyed by the batch-wide
    /// [`ExpandedEvents::payload_columns`]. Every column is present; cells
    /// this row's payload did not supply hold the empty string.
    pub payload: BTreeMap<String, String>,
}

impl ExpandedEvent {
    /// Value of a payload column for this row; `""` when absent.
    pub fn payload_value(&self, column: &str) -> &str {
        self.payload.get(column).map(String::as_str).unwrap_or("")
    }
}

/// A batch of events with their payloads exploded into flat columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedEvents {
    /// Distinct payload keys across the batch, sorted. Columns with no
    /// non-empty value in any row are dropped.
    pub payload_columns: Vec<String>,
    pub rows: Vec<ExpandedEvent>,
}

impl ExpandedEvents {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Expand `EventData` payloads into columns for `records`.
///
/// When `event_ids` is given only matching rows are processed; otherwise the
/// whole batch is expanded. Rows with a malformed or absent payload keep
/// their record unchanged and contribute empty cells only.
pub fn expand_events(records: &[EventRecord], event_ids: Option<&[u32]>) -> ExpandedEvents {
    let selected: Vec<EventRecord> = match event_ids {
        Some(ids) => filter_by_event_ids(records, ids),
        None => records.to_vec(),
    };

    debug!("expanding payloads for {} events", selected.len());

    // Per-row parse and absorb. A failed parse yields an empty residual.
    let mut parsed: Vec<(EventRecord, BTreeMap<String, String>)> = Vec::with_capacity(selected.len());
    for record in &selected {
        match record.event_data.as_deref().and_then(parse_payload) {
            Some(payload) => parsed.push(absorb_payload(record, payload)),
            None => parsed.push((record.clone(), BTreeMap::new())),
        }
    }

    // Columns already present on the records; residual keys shadowing one of
    // these never become payload columns (the record column wins).
    let mut existing: BTreeSet<String> = CORE_COLUMNS.iter().map(|c| c.to_string()).collect();
    for (record, _) in &parsed {
        existing.extend(record.extra.keys().cloned());
    }

    // Batch-wide column set: distinct residual keys with at least one
    // non-empty value. All-empty columns are pruned.
    let mut columns: BTreeMap<String, bool> = BTreeMap::new();
    for (_, residual) in &parsed {
        for (key, value) in residual {
            if existing.contains(key) {
                continue;
            }
            let has_value = columns.entry(key.clone()).or_insert(false);
            *has_value = *has_value || !value.is_empty();
        }
    }
    let payload_columns: Vec<String> = columns
        .into_iter()
        .filter_map(|(key, has_value)| has_value.then_some(key))
        .collect();

    // Normalize each row to exactly the surviving columns, empty-string
    // filled, so downstream consumers see a rectangular table.
    let rows = parsed
        .into_iter()
        .map(|(record, residual)| {
            let payload = payload_columns
                .iter()
                .map(|col| {
                    let value = residual.get(col).cloned().unwrap_or_default();
                    (col.clone(), value)
                })
                .collect();
            ExpandedEvent { record, payload }
        })
        .collect();

    ExpandedEvents {
        payload_columns,
        rows,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SCHEMA: &str = "http://schemas.microsoft.com/win/2004/08/events/event";

    fn make_event(event_id: u32, event_data: Option<&str>) -> EventRecord {
        EventRecord {
            event_id,
            activity: "activity".to_string(),
            account: "DOMAIN\\alice".to_string(),
            computer: "WKSTN01".to_string(),
            time_generated: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            event_data: event_data.map(str::to_string),
            extra: BTreeMap::new(),
        }
    }

    // ── parse_payload ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_payload_collects_data_elements() {
        let xml = format!(
            "<EventData xmlns=\"{SCHEMA}\">\
             <Data Name=\"TargetUserName\">bob</Data>\
             <Data Name=\"TargetDomainName\">CORP</Data>\
             </EventData>"
        );
        let map = parse_payload(&xml).unwrap();
        assert_eq!(map.get("TargetUserName").unwrap(), "bob");
        assert_eq!(map.get("TargetDomainName").unwrap(), "CORP");
    }

    #[test]
    fn test_parse_payload_self_closing_data_is_empty_value() {
        let xml = "<EventData><Data Name=\"SubjectLogonId\"/></EventData>";
        let map = parse_payload(xml).unwrap();
        assert_eq!(map.get("SubjectLogonId").unwrap(), "");
    }

    #[test]
    fn test_parse_payload_malformed_xml_is_none() {
        assert!(parse_payload("<EventData><Data Name=\"x\">oops</EventData>").is_none());
        assert!(parse_payload("not xml at all <<<").is_none());
    }

    #[test]
    fn test_parse_payload_plain_text_is_none() {
        // A bare "-" placeholder is not a payload.
        assert!(parse_payload("-").is_none());
    }

    #[test]
    fn test_parse_payload_unescapes_entities() {
        let xml = "<EventData><Data Name=\"CommandLine\">a &amp; b</Data></EventData>";
        let map = parse_payload(xml).unwrap();
        assert_eq!(map.get("CommandLine").unwrap(), "a & b");
    }

    #[test]
    fn test_parse_payload_ignores_non_data_elements() {
        let xml = "<EventData><Data Name=\"K\">v</Data><Binary>00AF</Binary></EventData>";
        let map = parse_payload(xml).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("K").unwrap(), "v");
    }

    // ── absorb_payload ────────────────────────────────────────────────────

    #[test]
    fn test_absorb_fills_empty_extra_column() {
        let mut record = make_event(4720, None);
        record.extra.insert("TargetUserName".to_string(), String::new());

        let mut payload = BTreeMap::new();
        payload.insert("TargetUserName".to_string(), "bob".to_string());
        payload.insert("TargetSid".to_string(), "S-1-5-21".to_string());

        let (updated, residual) = absorb_payload(&record, payload);
        assert_eq!(updated.extra.get("TargetUserName").unwrap(), "bob");
        // Absorbed key leaves the residual; the rest stays.
        assert!(!residual.contains_key("TargetUserName"));
        assert_eq!(residual.get("TargetSid").unwrap(), "S-1-5-21");
    }

    #[test]
    fn test_absorb_keeps_non_empty_columns() {
        let mut record = make_event(4720, None);
        record.extra.insert("TargetUserName".to_string(), "carol".to_string());

        let mut payload = BTreeMap::new();
        payload.insert("TargetUserName".to_string(), "bob".to_string());

        let (updated, residual) = absorb_payload(&record, payload);
        assert_eq!(updated.extra.get("TargetUserName").unwrap(), "carol");
        assert_eq!(residual.get("TargetUserName").unwrap(), "bob");
    }

    #[test]
    fn test_absorb_fills_empty_core_column() {
        let mut record = make_event(4720, None);
        record.account.clear();

        let mut payload = BTreeMap::new();
        payload.insert("Account".to_string(), "CORP\\dave".to_string());

        let (updated, residual) = absorb_payload(&record, payload);
        assert_eq!(updated.account, "CORP\\dave");
        assert!(residual.is_empty());
    }

    #[test]
    fn test_absorb_does_not_mutate_input() {
        let mut record = make_event(4720, None);
        record.extra.insert("TargetUserName".to_string(), String::new());
        let mut payload = BTreeMap::new();
        payload.insert("TargetUserName".to_string(), "bob".to_string());

        let _ = absorb_payload(&record, payload);
        assert_eq!(record.extra.get("TargetUserName").unwrap(), "");
    }

    // ── expand_events ─────────────────────────────────────────────────────

    #[test]
    fn test_expand_builds_columns_across_batch() {
        let records = vec![
            make_event(
                4720,
                Some("<EventData><Data Name=\"TargetUserName\">bob</Data></EventData>"),
            ),
            make_event(
                4732,
                Some("<EventData><Data Name=\"MemberSid\">S-1-5-21</Data></EventData>"),
            ),
        ];
        let expanded = expand_events(&records, None);

        assert_eq!(
            expanded.payload_columns,
            vec!["MemberSid".to_string(), "TargetUserName".to_string()]
        );
        assert_eq!(expanded.rows[0].payload_value("TargetUserName"), "bob");
        // Cells the row's payload did not supply are empty strings.
        assert_eq!(expanded.rows[0].payload_value("MemberSid"), "");
        assert_eq!(expanded.rows[1].payload_value("MemberSid"), "S-1-5-21");
    }

    #[test]
    fn test_expand_absorbed_key_not_duplicated_as_column() {
        let mut record = make_event(
            4720,
            Some("<EventData><Data Name=\"TargetUserName\">bob</Data></EventData>"),
        );
        record.extra.insert("TargetUserName".to_string(), String::new());

        let expanded = expand_events(&[record], None);
        assert_eq!(
            expanded.rows[0].record.extra.get("TargetUserName").unwrap(),
            "bob"
        );
        assert!(!expanded
            .payload_columns
            .contains(&"TargetUserName".to_string()));
    }

    #[test]
    fn test_expand_does_not_duplicate_shadowed_columns() {
        // The record already holds a non-empty TargetUserName, so the payload
        // value is neither absorbed nor exploded into a second column.
        let mut record = make_event(
            4720,
            Some("<EventData><Data Name=\"TargetUserName\">bob</Data></EventData>"),
        );
        record.extra.insert("TargetUserName".to_string(), "carol".to_string());

        let expanded = expand_events(&[record], None);
        assert_eq!(
            expanded.rows[0].record.extra.get("TargetUserName").unwrap(),
            "carol"
        );
        assert!(expanded.payload_columns.is_empty());
    }

    #[test]
    fn test_expand_malformed_row_does_not_affect_others() {
        let records = vec![
            make_event(4720, Some("<EventData><Data Name=\"K\">broken")),
            make_event(4732, Some("<EventData><Data Name=\"K\">ok</Data></EventData>")),
        ];
        let expanded = expand_events(&records, None);

        assert_eq!(expanded.rows.len(), 2);
        assert_eq!(expanded.rows[0].payload_value("K"), "");
        assert_eq!(expanded.rows[1].payload_value("K"), "ok");
    }

    #[test]
    fn test_expand_drops_all_empty_columns() {
        let records = vec![
            make_event(4720, Some("<EventData><Data Name=\"Empty\"/></EventData>")),
            make_event(4726, Some("<EventData><Data Name=\"Empty\"></Data></EventData>")),
        ];
        let expanded = expand_events(&records, None);
        assert!(expanded.payload_columns.is_empty());
        assert_eq!(expanded.rows.len(), 2);
    }

    #[test]
    fn test_expand_restricts_by_event_ids() {
        let records = vec![
            make_event(4720, Some("<EventData><Data Name=\"A\">1</Data></EventData>")),
            make_event(4732, Some("<EventData><Data Name=\"B\">2</Data></EventData>")),
        ];
        let expanded = expand_events(&records, Some(&[4732]));
        assert_eq!(expanded.rows.len(), 1);
        assert_eq!(expanded.rows[0].record.event_id, 4732);
        assert_eq!(expanded.payload_columns, vec!["B".to_string()]);
    }

    #[test]
    fn test_expand_missing_payload_rows_survive() {
        let records = vec![make_event(4720, None)];
        let expanded = expand_events(&records, None);
        assert_eq!(expanded.rows.len(), 1);
        assert!(expanded.payload_columns.is_empty());
    }

    #[test]
    fn test_expand_is_deterministic() {
        let records = vec![
            make_event(
                4720,
                Some("<EventData><Data Name=\"X\">1</Data><Data Name=\"Y\">2</Data></EventData>"),
            ),
            make_event(4732, Some("<EventData><Data Name=\"Z\">3</Data></EventData>")),
            make_event(4698, Some("garbage <<<")),
        ];
        let first = expand_events(&records, None);
        let second = expand_events(&records, None);
        assert_eq!(first, second);
    }
}
