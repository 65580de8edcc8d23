// File: src/persistence.rs
use crate::core::types::{NameRecord, NewRecord, RecordId};
use crate::error::Result;
use parking_lot::Mutex;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Error, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A record as written to the snapshot. Derived forms are not stored; they are
/// recomputed on load so rule changes apply to old snapshots too.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub name: String,
    pub name_devanagari: Option<String>,
    pub alternates: Vec<String>,
    pub age: Option<u32>,
    pub location: String,
    pub case_type: String,
    pub fir: String,
    /// bincode cannot carry `serde_json::Value`, so metadata travels as text.
    pub metadata_json: String,
}

impl StoredRecord {
    pub fn from_record(record: &NameRecord) -> Result<Self> {
        let metadata_json =
            serde_json::to_string(&record.metadata).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            name_devanagari: record.name_devanagari.clone(),
            alternates: record.alternates.clone(),
            age: record.age,
            location: record.location.clone(),
            case_type: record.case_type.clone(),
            fir: record.fir.clone(),
            metadata_json,
        })
    }

    pub fn into_new_record(self) -> Result<(RecordId, NewRecord)> {
        let metadata = if self.metadata_json.is_empty() {
            Default::default()
        } else {
            serde_json::from_str(&self.metadata_json).map_err(|e| Error::new(ErrorKind::InvalidData, e))?
        };
        Ok((
            self.id,
            NewRecord {
                name: self.name,
                name_devanagari: self.name_devanagari,
                alternates: self.alternates,
                age: self.age,
                location: self.location,
                case_type: self.case_type,
                fir: self.fir,
                metadata,
            },
        ))
    }
}

/// The serializable state of the corpus.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct SerializableState {
    records: Vec<StoredRecord>,
}

/// Durable home of the record corpus.
pub trait RecordStore: Send + Sync {
    /// Every stored record in insertion order; empty when nothing was saved yet.
    fn load(&self) -> Result<Vec<StoredRecord>>;
    /// Replaces the stored corpus with `records`.
    fn save(&self, records: &[Arc<NameRecord>]) -> Result<()>;
}

/// Bincode snapshot, replaced atomically on every save.
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self) -> Result<Vec<StoredRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);
        let state: SerializableState =
            bincode::deserialize_from(reader).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        tracing::info!("loaded {} records from {:?}", state.records.len(), self.path);
        Ok(state.records)
    }

    fn save(&self, records: &[Arc<NameRecord>]) -> Result<()> {
        let parent_dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent_dir)?;

        let state = SerializableState {
            records: records.iter().map(|r| StoredRecord::from_record(r)).collect::<Result<_>>()?,
        };

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        let mut writer = BufWriter::new(temp_file.as_file());
        bincode::serialize_into(&mut writer, &state).map_err(|e| Error::new(ErrorKind::Other, e))?;
        writer.flush()?;
        drop(writer);
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        tracing::debug!("saved {} records to {:?}", state.records.len(), self.path);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> Result<Vec<StoredRecord>> {
        Ok(self.records.lock().clone())
    }

    fn save(&self, records: &[Arc<NameRecord>]) -> Result<()> {
        let stored = records.iter().map(|r| StoredRecord::from_record(r)).collect::<Result<Vec<_>>>()?;
        *self.records.lock() = stored;
        Ok(())
    }
}

/// One row of the case dataset export.
#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(rename = "First Name (Roman)", default)]
    first: Option<String>,
    #[serde(rename = "Middle Name (Roman)", default)]
    middle: Option<String>,
    #[serde(rename = "Last Name (Roman)", default)]
    last: Option<String>,
    #[serde(rename = "Alternative Roman Spellings", default)]
    alternatives: Option<String>,
    #[serde(rename = "First Name (Devanagari)", default)]
    first_deva: Option<String>,
    #[serde(rename = "Middle Name (Devanagari)", default)]
    middle_deva: Option<String>,
    #[serde(rename = "Last Name (Devanagari)", default)]
    last_deva: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(default)]
    age: Option<String>,
    #[serde(rename = "caseType", default)]
    case_type: Option<String>,
    #[serde(rename = "caseFIR", default)]
    fir: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

fn join_parts(parts: &[&Option<String>]) -> String {
    parts
        .iter()
        .filter_map(|p| p.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl SeedRow {
    fn into_new_record(self) -> Option<NewRecord> {
        let name = join_parts(&[&self.first, &self.middle, &self.last]);
        let deva = join_parts(&[&self.first_deva, &self.middle_deva, &self.last_deva]);
        let name = if name.is_empty() { deva.clone() } else { name };
        if name.is_empty() {
            return None;
        }

        let alternates: Vec<String> = self
            .alternatives
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| vec![a.to_string()])
            .unwrap_or_default();

        let mut metadata = serde_json::Map::new();
        match self.gender.as_deref().map(str::trim) {
            Some("1") => {
                metadata.insert("gender".into(), "Male".into());
            }
            Some("0") | Some("2") => {
                metadata.insert("gender".into(), "Female".into());
            }
            Some(g) if !g.is_empty() => {
                metadata.insert("gender".into(), g.into());
            }
            _ => {}
        }

        Some(NewRecord {
            name_devanagari: Some(deva).filter(|d| !d.is_empty() && *d != name),
            alternates,
            // "34", "34.0" and "Unknown" all occur in exports
            age: self.age.as_deref().and_then(|a| a.trim().parse::<f64>().ok()).filter(|a| *a >= 0.0).map(|a| a as u32),
            location: self.location.unwrap_or_default().trim().to_string(),
            case_type: self.case_type.unwrap_or_default().trim().to_string(),
            fir: self.fir.unwrap_or_default().trim().to_string(),
            metadata,
            name,
        })
    }
}

/// Reads a seed corpus: CSV in the case dataset layout when the extension is
/// `.csv`, otherwise a JSON array of records. Rows without any name are skipped.
pub fn load_seed(path: &Path) -> Result<Vec<NewRecord>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        let mut records = Vec::new();
        for (line, row) in reader.deserialize::<SeedRow>().enumerate() {
            let row = row.map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
            match row.into_new_record() {
                Some(record) => records.push(record),
                None => tracing::warn!("seed row {} in {:?} has no name, skipped", line + 1, path),
            }
        }
        records
    } else {
        let file = File::open(path)?;
        let records: Vec<NewRecord> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        records.into_iter().filter(|r| !r.name.trim().is_empty()).collect()
    };

    tracing::info!("read {} seed records from {:?}", records.len(), path);
    Ok(records)
}
