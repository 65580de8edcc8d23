// src/core/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique identifier for a stored record. Assigned by the engine in
/// insertion order.
pub type RecordId = u64;

/// The derived forms of one source string. Immutable once computed.
///
/// `roman` and `devanagari` are two renderings of the same name; `phonetic`
/// depends only on `normalized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedName {
    pub normalized: String,
    pub devanagari: String,
    pub roman: String,
    pub phonetic: String,
}

/// A canonical record in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRecord {
    pub id: RecordId,
    /// The name as entered, in its original script.
    pub name: String,
    /// Devanagari spelling supplied alongside a Roman name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_devanagari: Option<String>,
    /// Other spellings and aliases the person is known by.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<String>,
    pub processed: ProcessedName,
    /// Processed alternates and Devanagari spelling. Indexed and scored
    /// alongside `processed`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_forms: Vec<ProcessedName>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "case_type")]
    pub case_type: String,
    #[serde(default, alias = "caseFIR")]
    pub fir: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NameRecord {
    /// The primary form followed by every alternate form.
    pub fn forms(&self) -> impl Iterator<Item = &ProcessedName> {
        std::iter::once(&self.processed).chain(self.alternate_forms.iter())
    }
}

/// A record as submitted by an operator: everything except the generated
/// `id` and the derived `processed` forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub name: String,
    #[serde(default)]
    pub name_devanagari: Option<String>,
    #[serde(default)]
    pub alternates: Vec<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "case_type")]
    pub case_type: String,
    #[serde(default, alias = "caseFIR")]
    pub fir: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NewRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_case_type(mut self, case_type: impl Into<String>) -> Self {
        self.case_type = case_type.into();
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_fir(mut self, fir: impl Into<String>) -> Self {
        self.fir = fir.into();
        self
    }

    pub fn with_alternate(mut self, alternate: impl Into<String>) -> Self {
        self.alternates.push(alternate.into());
        self
    }
}

/// Optional conjunctive post-score filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, alias = "case_type", skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.case_type.is_none()
    }

    pub fn location(location: impl Into<String>) -> Self {
        Self { location: Some(location.into()), case_type: None }
    }
}

/// A scored candidate. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub record: std::sync::Arc<NameRecord>,
    /// In [0, 1].
    pub similarity: f64,
    /// `round(similarity * 100)`.
    pub confidence: u8,
    /// Edit distance between the compared forms, used as the first tie-break.
    pub edit_distance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Matched { id: RecordId },
    NoMatch,
}

/// One line of the append-only feedback log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub query: String,
    #[serde(default, skip_serializing_if = "SearchFilters::is_empty")]
    pub filters: SearchFilters,
    pub timestamp: DateTime<Utc>,
    pub outcome: FeedbackOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_record: Option<NameRecord>,
}
