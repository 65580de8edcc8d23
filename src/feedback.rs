// File: src/feedback.rs
//! Append-only feedback log: searches that found nothing acceptable, results
//! an operator confirmed, and records added by operators. Captured for later
//! tuning; nothing here re-ranks results.

use crate::core::index::NameIndex;
use crate::core::types::{FeedbackEvent, FeedbackOutcome, NameRecord, RecordId, SearchFilters};
use crate::error::{MatchError, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where feedback events end up.
pub trait FeedbackSink: Send + Sync {
    fn append(&self, event: &FeedbackEvent) -> Result<()>;
    /// All events in append order.
    fn events(&self) -> Result<Vec<FeedbackEvent>>;
}

/// One JSON object per line, opened in append mode for every write.
pub struct JsonlFeedbackSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFeedbackSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), write_lock: Mutex::new(()) }
    }
}

impl FeedbackSink for JsonlFeedbackSink {
    fn append(&self, event: &FeedbackEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)
            .map_err(|e| MatchError::StorageUnavailable { source: e.into() })?;
        line.push('\n');

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn events(&self) -> Result<Vec<FeedbackEvent>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                // A torn final line from a crash is skipped, not fatal.
                Err(e) => tracing::warn!("skipping unreadable feedback line in {:?}: {}", self.path, e),
            }
        }
        Ok(events)
    }
}

#[derive(Default)]
pub struct MemoryFeedbackSink {
    events: Mutex<Vec<FeedbackEvent>>,
}

impl MemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackSink for MemoryFeedbackSink {
    fn append(&self, event: &FeedbackEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn events(&self) -> Result<Vec<FeedbackEvent>> {
        Ok(self.events.lock().clone())
    }
}

pub struct FeedbackStore {
    sink: Box<dyn FeedbackSink>,
}

impl FeedbackStore {
    pub fn new(sink: Box<dyn FeedbackSink>) -> Self {
        Self { sink }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryFeedbackSink::new()))
    }

    pub fn record_no_match(&self, query: &str, filters: &SearchFilters) -> Result<()> {
        self.sink.append(&FeedbackEvent {
            query: query.to_string(),
            filters: filters.clone(),
            timestamp: Utc::now(),
            outcome: FeedbackOutcome::NoMatch,
            added_record: None,
        })
    }

    pub fn record_match(&self, query: &str, id: RecordId) -> Result<()> {
        self.sink.append(&FeedbackEvent {
            query: query.to_string(),
            filters: SearchFilters::default(),
            timestamp: Utc::now(),
            outcome: FeedbackOutcome::Matched { id },
            added_record: None,
        })
    }

    /// Inserts the record into the index, then logs it. The insert is visible
    /// to readers once this returns; a failed log write is only warned about.
    pub fn record_new_record(&self, index: &NameIndex, record: NameRecord) -> Result<Arc<NameRecord>> {
        let stored = index.insert(record)?;
        let event = FeedbackEvent {
            query: stored.name.clone(),
            filters: SearchFilters::default(),
            timestamp: Utc::now(),
            outcome: FeedbackOutcome::Matched { id: stored.id },
            added_record: Some((*stored).clone()),
        };
        if let Err(e) = self.sink.append(&event) {
            tracing::warn!("feedback for record {} not written: {}", stored.id, e);
        }
        Ok(stored)
    }

    pub fn events(&self) -> Result<Vec<FeedbackEvent>> {
        self.sink.events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_sink_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(Box::new(JsonlFeedbackSink::new(dir.path().join("fb").join("feedback.jsonl"))));

        store.record_no_match("sursh", &SearchFilters::location("Indore")).unwrap();
        store.record_match("suresh", 7).unwrap();

        let events = store.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].query, "sursh");
        assert_eq!(events[0].outcome, FeedbackOutcome::NoMatch);
        assert_eq!(events[0].filters.location.as_deref(), Some("Indore"));
        assert_eq!(events[1].outcome, FeedbackOutcome::Matched { id: 7 });
    }

    #[test]
    fn torn_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.jsonl");
        let sink = JsonlFeedbackSink::new(&path);
        sink.append(&FeedbackEvent {
            query: "ram".into(),
            filters: SearchFilters::default(),
            timestamp: Utc::now(),
            outcome: FeedbackOutcome::NoMatch,
            added_record: None,
        })
        .unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"query\":\"tru").unwrap();

        assert_eq!(sink.events().unwrap().len(), 1);
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlFeedbackSink::new(dir.path().join("none.jsonl"));
        assert!(sink.events().unwrap().is_empty());
    }

    #[test]
    fn unwritable_log_reports_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let store = FeedbackStore::new(Box::new(JsonlFeedbackSink::new(blocker.join("feedback.jsonl"))));

        let err = store.record_no_match("ram", &SearchFilters::default()).unwrap_err();
        assert!(matches!(err, MatchError::StorageUnavailable { .. }));
    }

    #[test]
    fn new_records_are_indexed_then_logged() {
        use crate::core::types::ProcessedName;

        let index = NameIndex::new(12, 256);
        let store = FeedbackStore::in_memory();
        let record = NameRecord {
            id: 3,
            name: "Suresh Kumar".into(),
            name_devanagari: None,
            alternates: Vec::new(),
            processed: ProcessedName {
                normalized: "suresh kumar".into(),
                devanagari: "सुरेश कुमार".into(),
                roman: "suresh kumar".into(),
                phonetic: "SRS KMR".into(),
            },
            alternate_forms: Vec::new(),
            age: Some(34),
            location: "Indore".into(),
            case_type: String::new(),
            fir: String::new(),
            metadata: Default::default(),
        };

        let stored = store.record_new_record(&index, record.clone()).unwrap();
        assert_eq!(stored.id, 3);
        assert_eq!(index.len(), 1);

        let events = store.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].added_record.as_ref(), Some(&record));

        // the duplicate is refused by the index and never logged
        assert!(store.record_new_record(&index, record).is_err());
        assert_eq!(store.events().unwrap().len(), 1);
    }
}
