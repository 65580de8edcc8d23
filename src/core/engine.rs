use crate::config::{AppConfig, MatchingConfig};
use crate::core::converter::{detect_script, Script, Transliterator};
use crate::core::index::NameIndex;
use crate::core::normalizer::Normalizer;
use crate::core::phonetic::PhoneticEncoder;
use crate::core::scorer::{confidence, Score, SimilarityScorer};
use crate::core::types::{
    FeedbackEvent, NameRecord, NewRecord, ProcessedName, RecordId, SearchFilters, SearchResult,
};
use crate::error::{MatchError, Result};
use crate::feedback::{FeedbackSink, FeedbackStore, JsonlFeedbackSink, MemoryFeedbackSink};
use crate::persistence::{load_seed, FileRecordStore, MemoryRecordStore, RecordStore};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;

// The matching engine: owns the derivation pipeline, the index and both stores.
// Shared behind an `Arc`; every method takes `&self`.
pub struct MatchEngine {
    config: MatchingConfig,
    normalizer: Normalizer,
    transliterator: Transliterator,
    encoder: PhoneticEncoder,
    scorer: SimilarityScorer,
    index: NameIndex,
    feedback: FeedbackStore,
    store: Box<dyn RecordStore>,
    // Next id to hand out. Held across insert and save so snapshots land in order.
    writer: Mutex<RecordId>,
}

impl MatchEngine {
    /// An engine with in-memory stores and an empty corpus.
    pub fn new(config: MatchingConfig) -> Result<Self> {
        Self::with_storage(config, Box::new(MemoryRecordStore::new()), Box::new(MemoryFeedbackSink::new()))
    }

    /// Loads every stored record and indexes it. Derived forms are recomputed.
    pub fn with_storage(
        config: MatchingConfig,
        store: Box<dyn RecordStore>,
        sink: Box<dyn FeedbackSink>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = Self {
            normalizer: Normalizer::with_honorifics(&config.honorifics),
            transliterator: Transliterator::new(),
            encoder: PhoneticEncoder::new(config.max_token_code_len, config.max_tokens),
            scorer: SimilarityScorer::from_config(&config)?,
            index: NameIndex::new(config.max_prefix_len, config.max_candidates),
            feedback: FeedbackStore::new(sink),
            store,
            writer: Mutex::new(1),
            config,
        };

        let stored = engine.store.load()?;
        let mut next_id = engine.writer.lock();
        for entry in stored {
            let (id, new) = entry.into_new_record()?;
            let record = engine.build_record(id, new);
            engine.index.insert(record)?;
            *next_id = (*next_id).max(id + 1);
        }
        drop(next_id);

        tracing::info!("engine ready with {} records", engine.index.len());
        Ok(engine)
    }

    /// File-backed engine for the binaries. Imports the seed corpus when the
    /// snapshot is still empty.
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        let engine = Self::with_storage(
            app.matching.clone(),
            Box::new(FileRecordStore::new(app.records_path())),
            Box::new(JsonlFeedbackSink::new(app.feedback_path())),
        )?;

        if engine.is_empty() {
            if let Some(seed) = app.seed_path() {
                let records = load_seed(&seed)?;
                let imported = engine.import(records)?;
                tracing::info!("imported {} seed records from {:?}", imported, seed);
            }
        }
        Ok(engine)
    }

    /// Derives every form of a raw name. Never fails; blank input yields blank forms.
    pub fn process(&self, raw: &str) -> ProcessedName {
        let normalized = self.normalizer.normalize(raw);
        let (roman, devanagari) = match detect_script(&normalized) {
            Script::Roman => (normalized.clone(), self.transliterator.to_devanagari(&normalized)),
            Script::Devanagari => (self.transliterator.to_roman(&normalized), normalized.clone()),
        };
        let phonetic = self.encoder.encode(&normalized);
        ProcessedName { normalized, devanagari, roman, phonetic }
    }

    /// Scored matches at or above `min_similarity` that satisfy every filter,
    /// best first. Ties go to the smaller edit distance, then to the older record.
    pub fn search(&self, raw: &str, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let query = self.process(raw);
        if query.normalized.is_empty() {
            return Err(MatchError::validation("query is blank"));
        }
        let filters = clean_filters(filters)?;

        let candidates = self.index.candidates_for(&query)?;
        let considered = candidates.len();
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|record| {
                let score = record
                    .forms()
                    .map(|form| self.scorer.score_detailed(&query, form))
                    .fold(None, |best: Option<Score>, s| match best {
                        Some(b) if b.similarity > s.similarity
                            || (b.similarity == s.similarity && b.edit_distance <= s.edit_distance) => Some(b),
                        _ => Some(s),
                    })?;
                if score.similarity < self.config.min_similarity || !passes(&record, &filters) {
                    return None;
                }
                Some(SearchResult {
                    confidence: confidence(score.similarity),
                    similarity: score.similarity,
                    edit_distance: score.edit_distance,
                    record,
                })
            })
            .collect();

        // Candidates arrive in insertion order; a stable sort keeps it for ties.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.edit_distance.cmp(&b.edit_distance))
        });
        if let Some(max) = self.config.max_results {
            results.truncate(max);
        }

        tracing::debug!(
            "search {:?}: {} candidates, {} results",
            query.normalized,
            considered,
            results.len()
        );
        Ok(results)
    }

    /// Completions for a partially typed name. The minimum trigger length is
    /// left to the caller.
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        let prefix = self.normalizer.normalize(prefix);
        if prefix.is_empty() {
            return Vec::new();
        }
        self.index.suggestions_for(&prefix, self.config.suggestion_limit)
    }

    /// Validates, indexes and persists a new record. On a storage failure the
    /// record stays searchable and `StorageUnavailable` is returned.
    pub fn add_record(&self, new: NewRecord) -> Result<Arc<NameRecord>> {
        if self.normalizer.normalize(&new.name).is_empty() {
            return Err(MatchError::validation("record name is blank"));
        }

        let mut next_id = self.writer.lock();
        let record = self.build_record(*next_id, new);
        let stored = self.feedback.record_new_record(&self.index, record)?;
        *next_id += 1;

        tracing::info!("added record {} ({})", stored.id, stored.name);
        if let Err(e) = self.store.save(&self.index.records()) {
            tracing::warn!("record {} indexed but not persisted: {}", stored.id, e);
            return Err(e);
        }
        Ok(stored)
    }

    /// Bulk insert without feedback events, saved once at the end.
    pub fn import(&self, records: Vec<NewRecord>) -> Result<usize> {
        let mut next_id = self.writer.lock();
        let mut imported = 0;
        for new in records {
            if self.normalizer.normalize(&new.name).is_empty() {
                continue;
            }
            let record = self.build_record(*next_id, new);
            self.index.insert(record)?;
            *next_id += 1;
            imported += 1;
        }
        if imported > 0 {
            self.store.save(&self.index.records())?;
        }
        Ok(imported)
    }

    /// Logs a query the operator found no acceptable match for.
    pub fn record_no_match(&self, query: &str, filters: &SearchFilters) -> Result<()> {
        if query.trim().is_empty() {
            return Err(MatchError::validation("query is blank"));
        }
        self.feedback.record_no_match(query.trim(), filters)
    }

    /// Logs that the operator picked record `id` for `query`.
    pub fn record_match(&self, query: &str, id: RecordId) -> Result<()> {
        if self.index.get(id).is_none() {
            return Err(MatchError::validation(format!("unknown record id {}", id)));
        }
        self.feedback.record_match(query.trim(), id)
    }

    pub fn feedback_events(&self) -> Result<Vec<FeedbackEvent>> {
        self.feedback.events()
    }

    pub fn get(&self, id: RecordId) -> Option<Arc<NameRecord>> {
        self.index.get(id)
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn build_record(&self, id: RecordId, new: NewRecord) -> NameRecord {
        let processed = self.process(&new.name);
        let name_devanagari = new
            .name_devanagari
            .map(|d| self.normalizer.normalize(&d))
            .filter(|d| !d.is_empty());

        let mut alternates: Vec<String> = Vec::new();
        for alternate in new.alternates.iter().flat_map(|a| split_alternates(a)) {
            if !alternates.iter().any(|a| a == alternate) {
                alternates.push(alternate.to_string());
            }
        }
        let mut alternate_forms: Vec<ProcessedName> = Vec::new();
        for raw in alternates.iter().chain(name_devanagari.iter()) {
            let form = self.process(raw);
            let known = form.normalized.is_empty()
                || form.normalized == processed.normalized
                || alternate_forms.iter().any(|f| f.normalized == form.normalized);
            if !known {
                alternate_forms.push(form);
            }
        }

        NameRecord {
            id,
            name: new.name.trim().to_string(),
            name_devanagari,
            alternates,
            processed,
            alternate_forms,
            age: new.age,
            location: new.location.trim().to_string(),
            case_type: new.case_type.trim().to_string(),
            fir: new.fir.trim().to_string(),
            metadata: new.metadata,
        }
    }
}

/// Alternates arrive one per entry or as a comma, semicolon or pipe separated
/// list, the way dataset exports store them. Words inside one entry stay together.
fn split_alternates(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c| matches!(c, ',' | ';' | '|')).map(str::trim).filter(|a| !a.is_empty())
}

/// Trims filter values; a value that is present but blank is malformed.
fn clean_filters(filters: &SearchFilters) -> Result<SearchFilters> {
    let clean = |name: &str, value: &Option<String>| -> Result<Option<String>> {
        match value {
            Some(v) if v.trim().is_empty() => Err(MatchError::validation(format!("{} filter is blank", name))),
            Some(v) => Ok(Some(v.trim().to_string())),
            None => Ok(None),
        }
    };
    Ok(SearchFilters {
        location: clean("location", &filters.location)?,
        case_type: clean("caseType", &filters.case_type)?,
    })
}

fn passes(record: &NameRecord, filters: &SearchFilters) -> bool {
    let matches = |want: &Option<String>, have: &str| {
        want.as_ref().map_or(true, |w| w.to_lowercase() == have.trim().to_lowercase())
    };
    matches(&filters.location, &record.location) && matches(&filters.case_type, &record.case_type)
}
