// File: src/core/index.rs
use crate::core::trie::PrefixTrie;
use crate::core::types::{NameRecord, ProcessedName, RecordId};
use crate::error::{MatchError, Result};
use crate::fuzzy::symspell::SymSpell;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Position of a record in insertion order.
type Seq = usize;

struct IndexInner {
    records: Vec<Arc<NameRecord>>,
    by_id: HashMap<RecordId, Seq>,
    /// normalized, roman and devanagari forms
    exact: HashMap<String, Vec<Seq>>,
    /// full phonetic code
    phonetic: HashMap<String, Vec<Seq>>,
    /// per-word phonetic codes
    token_phonetic: HashMap<String, Vec<Seq>>,
    fuzzy_codes: SymSpell,
    fuzzy_tokens: SymSpell,
    prefixes: PrefixTrie,
}

/// Keys of one record, computed before the write lock is taken.
struct RecordKeys {
    exact: Vec<String>,
    phonetic: Vec<String>,
    tokens: Vec<String>,
    suggestions: Vec<String>,
}

impl RecordKeys {
    /// Exact and phonetic keys cover every form of the record; suggestions
    /// come from the primary form only.
    fn of(record: &NameRecord) -> Self {
        let mut exact = Vec::new();
        let mut phonetic = Vec::new();
        let mut tokens = Vec::new();
        for form in record.forms() {
            exact.extend([form.normalized.clone(), form.roman.clone(), form.devanagari.clone()]);
            phonetic.push(form.phonetic.clone());
            tokens.extend(form.phonetic.split(' ').map(String::from));
        }
        if let Some(deva) = &record.name_devanagari {
            exact.push(deva.clone());
        }
        for keys in [&mut exact, &mut phonetic, &mut tokens] {
            keys.retain(|k| !k.is_empty());
            keys.sort();
            keys.dedup();
        }

        let p = &record.processed;
        let mut suggestions = vec![p.normalized.clone(), p.roman.clone(), p.devanagari.clone()];
        suggestions.retain(|s| !s.is_empty());
        suggestions.dedup();

        Self { exact, phonetic, tokens, suggestions }
    }
}

/// The read-mostly in-memory index over the record corpus.
///
/// All keys of a record are applied under a single write guard, so readers see
/// a record under all of its keys or under none. Readers share the lock.
pub struct NameIndex {
    inner: RwLock<IndexInner>,
    max_candidates: usize,
}

impl NameIndex {
    pub fn new(max_prefix_len: usize, max_candidates: usize) -> Self {
        let inner = IndexInner {
            records: Vec::new(),
            by_id: HashMap::new(),
            exact: HashMap::new(),
            phonetic: HashMap::new(),
            token_phonetic: HashMap::new(),
            fuzzy_codes: SymSpell::new(1),
            fuzzy_tokens: SymSpell::new(1),
            prefixes: PrefixTrie::new(max_prefix_len),
        };
        Self {
            inner: RwLock::new(inner),
            max_candidates: max_candidates.max(1),
        }
    }

    /// Adds a record under its exact, phonetic and prefix keys.
    /// A duplicate id is rejected before anything is touched.
    pub fn insert(&self, record: NameRecord) -> Result<Arc<NameRecord>> {
        let keys = RecordKeys::of(&record);
        let record = Arc::new(record);

        let mut inner = self.inner.write();
        if inner.by_id.contains_key(&record.id) {
            return Err(MatchError::inconsistency(format!("record id {} already indexed", record.id)));
        }

        let seq = inner.records.len();
        inner.records.push(Arc::clone(&record));
        inner.by_id.insert(record.id, seq);

        for key in keys.exact {
            inner.exact.entry(key).or_default().push(seq);
        }
        for code in keys.phonetic {
            inner.fuzzy_codes.add_key(&code);
            inner.phonetic.entry(code).or_default().push(seq);
        }
        for token in keys.tokens {
            inner.fuzzy_tokens.add_key(&token);
            inner.token_phonetic.entry(token).or_default().push(seq);
        }
        for text in &keys.suggestions {
            inner.prefixes.insert(text);
        }

        tracing::debug!("indexed record {} ({:?})", record.id, record.processed.normalized);
        Ok(record)
    }

    /// Every record holding one of the query's exact keys, then the phonetic,
    /// one-edit phonetic and per-word buckets up to `max_candidates` in that
    /// priority order. Exact hits are never capped. Returned in insertion order.
    pub fn candidates_for(&self, processed: &ProcessedName) -> Result<Vec<Arc<NameRecord>>> {
        let inner = self.inner.read();
        let mut picked: Vec<Seq> = Vec::new();
        let mut seen: HashSet<Seq> = HashSet::new();

        for key in [&processed.normalized, &processed.roman, &processed.devanagari] {
            for &seq in inner.exact.get(key.as_str()).into_iter().flatten() {
                if seen.insert(seq) {
                    picked.push(seq);
                }
            }
        }

        let cap = self.max_candidates.max(picked.len());
        let mut take = |bucket: Option<&Vec<Seq>>, picked: &mut Vec<Seq>| -> bool {
            for &seq in bucket.into_iter().flatten() {
                if picked.len() == cap {
                    return false;
                }
                if seen.insert(seq) {
                    picked.push(seq);
                }
            }
            picked.len() < cap
        };

        let tokens: Vec<&str> = processed.phonetic.split(' ').filter(|t| !t.is_empty()).collect();

        'tiers: {
            if picked.len() >= cap || processed.phonetic.is_empty() {
                break 'tiers;
            }
            if !take(inner.phonetic.get(&processed.phonetic), &mut picked) {
                break 'tiers;
            }
            for code in inner.fuzzy_codes.lookup(&processed.phonetic) {
                if !take(inner.phonetic.get(&code), &mut picked) {
                    break 'tiers;
                }
            }
            for token in &tokens {
                if !take(inner.token_phonetic.get(*token), &mut picked) {
                    break 'tiers;
                }
            }
            for token in &tokens {
                for code in inner.fuzzy_tokens.lookup(token) {
                    if !take(inner.token_phonetic.get(&code), &mut picked) {
                        break 'tiers;
                    }
                }
            }
        }

        picked.sort_unstable();
        tracing::debug!("{} candidates for {:?}", picked.len(), processed.normalized);
        picked
            .into_iter()
            .map(|seq| {
                inner.records.get(seq).cloned().ok_or_else(|| {
                    MatchError::inconsistency(format!("bucket refers to missing slot {}", seq))
                })
            })
            .collect()
    }

    /// Up to `limit` suggestion texts starting with `prefix`, sorted and deduplicated.
    pub fn suggestions_for(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.inner.read().prefixes.complete(prefix, limit)
    }

    pub fn get(&self, id: RecordId) -> Option<Arc<NameRecord>> {
        let inner = self.inner.read();
        inner.by_id.get(&id).and_then(|&seq| inner.records.get(seq).cloned())
    }

    /// Every record in insertion order.
    pub fn records(&self) -> Vec<Arc<NameRecord>> {
        self.inner.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every record is reachable from each of its keys.
    pub fn verify(&self) -> Result<()> {
        let inner = self.inner.read();

        for (seq, record) in inner.records.iter().enumerate() {
            let keys = RecordKeys::of(record);
            let holds = |map: &HashMap<String, Vec<Seq>>, key: &str| {
                map.get(key).map_or(false, |bucket| bucket.contains(&seq))
            };

            if inner.by_id.get(&record.id) != Some(&seq) {
                return Err(MatchError::inconsistency(format!("record {} missing from id map", record.id)));
            }
            if let Some(key) = keys.exact.iter().find(|k| !holds(&inner.exact, k.as_str())) {
                return Err(MatchError::inconsistency(format!("record {} missing exact key {:?}", record.id, key)));
            }
            if let Some(code) = keys.phonetic.iter().find(|c| !holds(&inner.phonetic, c.as_str())) {
                return Err(MatchError::inconsistency(format!("record {} missing phonetic key {:?}", record.id, code)));
            }
            if let Some(token) = keys.tokens.iter().find(|t| !holds(&inner.token_phonetic, t.as_str())) {
                return Err(MatchError::inconsistency(format!("record {} missing word key {:?}", record.id, token)));
            }
            if let Some(text) = keys.suggestions.iter().find(|t| !inner.prefixes.contains(t.as_str())) {
                return Err(MatchError::inconsistency(format!("record {} missing prefix key {:?}", record.id, text)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: RecordId, normalized: &str, phonetic: &str) -> NameRecord {
        NameRecord {
            id,
            name: normalized.to_string(),
            name_devanagari: None,
            alternates: Vec::new(),
            processed: ProcessedName {
                normalized: normalized.to_string(),
                devanagari: String::new(),
                roman: normalized.to_string(),
                phonetic: phonetic.to_string(),
            },
            alternate_forms: Vec::new(),
            age: None,
            location: String::new(),
            case_type: String::new(),
            fir: String::new(),
            metadata: Default::default(),
        }
    }

    fn query(normalized: &str, phonetic: &str) -> ProcessedName {
        record(0, normalized, phonetic).processed
    }

    fn ids(records: &[Arc<NameRecord>]) -> Vec<RecordId> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn exact_match_is_never_missed() {
        let index = NameIndex::new(12, 256);
        index.insert(record(1, "suresh kumar", "SRS KMR")).unwrap();
        index.insert(record(2, "ramesh", "RMS")).unwrap();

        // a phonetic code that matches nothing still finds the exact text
        let hits = index.candidates_for(&query("suresh kumar", "ZZZ")).unwrap();
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn phonetic_and_one_edit_buckets() {
        let index = NameIndex::new(12, 256);
        index.insert(record(1, "suresh kumar", "SRS KMR")).unwrap();
        index.insert(record(2, "suresh kumari", "SRS KMR")).unwrap();
        index.insert(record(3, "suresh kumra", "SRS KMRA")).unwrap();
        index.insert(record(4, "vikas", "VKS")).unwrap();

        let hits = index.candidates_for(&query("sursh kumar", "SRS KMR")).unwrap();
        assert_eq!(ids(&hits), vec![1, 2, 3]);
    }

    #[test]
    fn single_word_reaches_multi_word_names() {
        let index = NameIndex::new(12, 256);
        index.insert(record(1, "suresh kumar", "SRS KMR")).unwrap();
        index.insert(record(2, "vikas", "VKS")).unwrap();

        let hits = index.candidates_for(&query("suresh", "SRS")).unwrap();
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn candidate_sets_are_capped() {
        let index = NameIndex::new(12, 3);
        for id in 0..10 {
            index.insert(record(id, &format!("ram {}", id), "RM")).unwrap();
        }
        let hits = index.candidates_for(&query("ram", "RM")).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn exact_hits_ignore_the_cap() {
        let index = NameIndex::new(12, 3);
        for id in 0..6 {
            index.insert(record(id, "suresh kumar", "SRS KMR")).unwrap();
        }
        index.insert(record(6, "suresh kumari", "SRS KMR")).unwrap();

        let hits = index.candidates_for(&query("suresh kumar", "SRS KMR")).unwrap();
        assert_eq!(ids(&hits), vec![0, 1, 2, 3, 4, 5]);

        // below the cap the phonetic tiers still fill in
        let index = NameIndex::new(12, 3);
        index.insert(record(0, "suresh kumar", "SRS KMR")).unwrap();
        index.insert(record(1, "suresh kumari", "SRS KMR")).unwrap();
        let hits = index.candidates_for(&query("suresh kumar", "SRS KMR")).unwrap();
        assert_eq!(ids(&hits), vec![0, 1]);
    }

    #[test]
    fn alternate_forms_are_keyed() {
        let index = NameIndex::new(12, 256);
        let mut shyam = record(1, "shyam lal", "SYM LL");
        shyam.alternate_forms.push(query("bablu", "BBL"));
        index.insert(shyam).unwrap();
        index.insert(record(2, "vikas", "VKS")).unwrap();

        assert_eq!(ids(&index.candidates_for(&query("bablu", "BBL")).unwrap()), vec![1]);
        assert_eq!(ids(&index.candidates_for(&query("babloo", "BBL")).unwrap()), vec![1]);
        // aliases are searchable, not suggested
        assert!(index.suggestions_for("bab", 10).is_empty());
        index.verify().unwrap();
    }

    #[test]
    fn duplicate_ids_are_rejected_without_side_effects() {
        let index = NameIndex::new(12, 256);
        index.insert(record(1, "suresh", "SRS")).unwrap();
        let err = index.insert(record(1, "ramesh", "RMS")).unwrap_err();
        assert!(matches!(err, MatchError::IndexInconsistency(_)));
        assert_eq!(index.len(), 1);
        assert!(index.suggestions_for("ram", 10).is_empty());
        index.verify().unwrap();
    }

    #[test]
    fn suggestions_are_sorted_and_limited() {
        let index = NameIndex::new(12, 256);
        for (id, name) in ["suresh kumar", "sunil", "suresh kumar", "ramesh", "sudha"].iter().enumerate() {
            index.insert(record(id as RecordId, name, "X")).unwrap();
        }
        assert_eq!(index.suggestions_for("su", 10), vec!["sudha", "sunil", "suresh kumar"]);
        assert_eq!(index.suggestions_for("su", 2), vec!["sudha", "sunil"]);
        assert_eq!(index.get(3).map(|r| r.processed.normalized.clone()), Some("ramesh".to_string()));
    }
}
