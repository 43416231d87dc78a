//! Query-provider abstraction and the JSONL file provider.
//!
//! The notebooklet only consumes the provider's return shape (a tabular set
//! of [`EventRecord`]s); transport is the provider's concern. The bundled
//! [`JsonlEventProvider`] reads exported event logs from disk, one JSON
//! object per line.

use std::path::{Path, PathBuf};

use hostevents_core::error::{NotebookletError, Result};
use hostevents_core::models::{EventRecord, TimeSpan};
use tracing::{debug, warn};

// ── QueryRefinement ───────────────────────────────────────────────────────────

/// Optional restriction applied by the provider at query time.
///
/// The remote-store equivalent would be an appended query clause; each
/// provider applies it natively.
#[derive(Debug, Clone, Default)]
pub struct QueryRefinement {
    /// Event ids to exclude from the result set.
    pub exclude_event_ids: Vec<u32>,
}

impl QueryRefinement {
    pub fn excluding(event_ids: &[u32]) -> Self {
        Self {
            exclude_event_ids: event_ids.to_vec(),
        }
    }
}

// ── QueryProvider ─────────────────────────────────────────────────────────────

/// Issues time-ranged event queries for a single host.
pub trait QueryProvider {
    /// Fetch all events for `host` within `timespan`, minus any ids excluded
    /// by `refinement`. Rows come back sorted by `TimeGenerated`.
    fn query_host_events(
        &self,
        timespan: &TimeSpan,
        host: &str,
        refinement: &QueryRefinement,
    ) -> Result<Vec<EventRecord>>;
}

// ── JsonlEventProvider ────────────────────────────────────────────────────────

/// File-backed provider reading `.jsonl` event exports under a directory.
#[derive(Debug)]
pub struct JsonlEventProvider {
    root: PathBuf,
}

impl JsonlEventProvider {
    /// Create a provider over `root`. Fails when the directory is absent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(NotebookletError::DataPathNotFound(root));
        }
        Ok(Self { root })
    }

    /// Find all `.jsonl` files recursively under the root, sorted by path.
    fn find_jsonl_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .map(|ext| ext == "jsonl")
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        files
    }
}

impl QueryProvider for JsonlEventProvider {
    fn query_host_events(
        &self,
        timespan: &TimeSpan,
        host: &str,
        refinement: &QueryRefinement,
    ) -> Result<Vec<EventRecord>> {
        let files = self.find_jsonl_files();
        if files.is_empty() {
            warn!("No JSONL files found in {}", self.root.display());
            return Ok(Vec::new());
        }

        let mut records: Vec<EventRecord> = Vec::new();
        for path in &files {
            records.extend(read_event_file(path, timespan, host, refinement)?);
        }

        records.sort_by_key(|r| r.time_generated);

        debug!(
            "loaded {} events for {} from {} files",
            records.len(),
            host,
            files.len()
        );
        Ok(records)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse one JSONL export file, keeping only rows for `host` within
/// `timespan` and not excluded by `refinement`. Unparseable lines are
/// logged and skipped.
fn read_event_file(
    path: &Path,
    timespan: &TimeSpan,
    host: &str,
    refinement: &QueryRefinement,
) -> Result<Vec<EventRecord>> {
    use std::io::BufRead;

    let file = std::fs::File::open(path).map_err(|source| NotebookletError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    let mut lines_read = 0u64;
    let mut lines_skipped = 0u64;

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines_read += 1;

        let record: EventRecord = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                debug!("Failed to parse JSON line in {}: {}", path.display(), e);
                lines_skipped += 1;
                continue;
            }
        };

        if !record.computer.eq_ignore_ascii_case(host) {
            continue;
        }
        if !timespan.contains(record.time_generated) {
            continue;
        }
        if refinement.exclude_event_ids.contains(&record.event_id) {
            continue;
        }

        records.push(record);
    }

    debug!(
        "File {}: {} lines read, {} skipped, {} kept",
        path.display(),
        lines_read,
        lines_skipped,
        records.len()
    );

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::TempDir;

    fn span() -> TimeSpan {
        TimeSpan::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
        )
    }

    fn sample_line(event_id: u32, computer: &str, ts: &str) -> String {
        serde_json::json!({
            "EventID": event_id,
            "Activity": "some activity",
            "Account": "DOMAIN\\alice",
            "Computer": computer,
            "TimeGenerated": ts,
            "EventData": "<EventData/>",
        })
        .to_string()
    }

    fn write_jsonl(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[test]
    fn test_provider_missing_root_is_error() {
        let err = JsonlEventProvider::new("/definitely/not/here").unwrap_err();
        assert!(matches!(err, NotebookletError::DataPathNotFound(_)));
    }

    #[test]
    fn test_provider_empty_directory_returns_no_rows() {
        let dir = TempDir::new().unwrap();
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "WKSTN01", &QueryRefinement::default())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_provider_filters_by_host_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            dir.path(),
            "events.jsonl",
            &[
                &sample_line(4720, "WKSTN01", "2024-03-01T10:00:00Z"),
                &sample_line(4720, "OTHERHOST", "2024-03-01T10:00:00Z"),
            ],
        );
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "wkstn01", &QueryRefinement::default())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].computer, "WKSTN01");
    }

    #[test]
    fn test_provider_filters_by_timespan() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            dir.path(),
            "events.jsonl",
            &[
                &sample_line(4720, "WKSTN01", "2024-03-01T10:00:00Z"),
                &sample_line(4720, "WKSTN01", "2024-02-28T10:00:00Z"),
            ],
        );
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "WKSTN01", &QueryRefinement::default())
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_provider_applies_refinement_exclusions() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            dir.path(),
            "events.jsonl",
            &[
                &sample_line(4688, "WKSTN01", "2024-03-01T10:00:00Z"),
                &sample_line(4624, "WKSTN01", "2024-03-01T11:00:00Z"),
                &sample_line(4720, "WKSTN01", "2024-03-01T12:00:00Z"),
            ],
        );
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "WKSTN01", &QueryRefinement::excluding(&[4688, 4624]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, 4720);
    }

    #[test]
    fn test_provider_skips_bad_lines_and_sorts_by_time() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            dir.path(),
            "events.jsonl",
            &[
                &sample_line(4726, "WKSTN01", "2024-03-01T12:00:00Z"),
                "{this is not json",
                &sample_line(4720, "WKSTN01", "2024-03-01T10:00:00Z"),
            ],
        );
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "WKSTN01", &QueryRefinement::default())
            .unwrap();
        let ids: Vec<u32> = rows.iter().map(|r| r.event_id).collect();
        assert_eq!(ids, vec![4720, 4726]);
    }

    #[test]
    fn test_provider_merges_multiple_files() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            dir.path(),
            "a.jsonl",
            &[&sample_line(4720, "WKSTN01", "2024-03-01T10:00:00Z")],
        );
        let nested = dir.path().join("archive");
        std::fs::create_dir_all(&nested).unwrap();
        write_jsonl(
            &nested,
            "b.jsonl",
            &[&sample_line(4732, "WKSTN01", "2024-03-01T11:00:00Z")],
        );
        let provider = JsonlEventProvider::new(dir.path()).unwrap();
        let rows = provider
            .query_host_events(&span(), "WKSTN01", &QueryRefinement::default())
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
