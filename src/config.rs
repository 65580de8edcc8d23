// File: src/config.rs
//! Application configuration.
//!
//! Loaded from a JSON file; a default file is written on first run. Every
//! field carries a serde default so a partial file still loads.

use crate::error::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "NAME_MATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Bincode snapshot of the record corpus (relative to data_dir).
    pub records_file: String,
    /// JSON-lines feedback log (relative to data_dir).
    pub feedback_file: String,
    /// Optional JSON or CSV corpus imported when no snapshot exists yet.
    pub seed_file: Option<String>,
}

/// Tunable matching parameters. The rule tables themselves are fixed in code;
/// these are the knobs around them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Weight of edit similarity. Must sum to 1.0 with `phonetic_weight`.
    pub edit_weight: f64,
    pub phonetic_weight: f64,
    /// Phonetic agreement granted for a single-edit code difference.
    pub phonetic_partial: f64,
    /// Candidates scoring below this are discarded.
    pub min_similarity: f64,
    pub max_candidates: usize,
    pub max_results: Option<usize>,
    /// Depth cap of the suggestion trie, in chars.
    pub max_prefix_len: usize,
    pub suggestion_limit: usize,
    /// Shortest prefix the HTTP layer forwards to `suggest`.
    pub min_suggest_len: usize,
    pub max_token_code_len: usize,
    pub max_tokens: usize,
    /// Honorifics stripped as whole words by the normalizer.
    pub honorifics: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            records_file: "records.bin".to_string(),
            feedback_file: "feedback.jsonl".to_string(),
            seed_file: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            edit_weight: 0.7,
            phonetic_weight: 0.3,
            phonetic_partial: 0.5,
            min_similarity: 0.35,
            max_candidates: 256,
            max_results: None,
            max_prefix_len: 12,
            suggestion_limit: 10,
            min_suggest_len: 3,
            max_token_code_len: 6,
            max_tokens: 4,
            honorifics: ["mr", "mrs", "ms", "dr", "shri", "shree", "smt", "sri", "kumari", "km"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MatchingConfig {
    /// Rejects weights and thresholds the scorer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.edit_weight < 0.0 || self.phonetic_weight < 0.0 {
            return Err(MatchError::validation("similarity weights must be non-negative"));
        }
        if (self.edit_weight + self.phonetic_weight - 1.0).abs() > 1e-6 {
            return Err(MatchError::validation(format!(
                "similarity weights must sum to 1.0 (got {} + {})",
                self.edit_weight, self.phonetic_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.phonetic_partial) {
            return Err(MatchError::validation("phonetic_partial must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(MatchError::validation("min_similarity must lie in [0, 1]"));
        }
        if self.max_prefix_len == 0 || self.max_token_code_len == 0 || self.max_tokens == 0 {
            return Err(MatchError::validation("length limits must be positive"));
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.records_file)
    }

    pub fn feedback_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.feedback_file)
    }

    pub fn seed_path(&self) -> Option<PathBuf> {
        self.storage.seed_file.as_ref().map(PathBuf::from)
    }
}

/// Path from `NAME_MATCH_CONFIG`, falling back to `./config.json`.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the config at `path`, writing the defaults there first if the file
/// does not exist.
pub fn load_or_create(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let config = AppConfig::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&config)
            .map_err(|e| MatchError::Config(e.to_string()))?;
        fs::write(path, body)?;
        tracing::info!("Created default config at {:?}", path);
        return Ok(config);
    }

    let body = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&body)
        .map_err(|e| MatchError::Config(format!("{}: {}", path.display(), e)))?;
    config.matching.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "server": { "port": 9000 }, "matching": { "min_similarity": 0.5 } }"#)
            .unwrap();

        let config = load_or_create(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.matching.min_similarity, 0.5);
        assert_eq!(config.matching.suggestion_limit, 10);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.matching.edit_weight, 0.7);

        let reloaded = load_or_create(&path).unwrap();
        assert_eq!(reloaded.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut matching = MatchingConfig::default();
        matching.edit_weight = 0.9;
        assert!(matches!(matching.validate(), Err(MatchError::Validation(_))));
    }
}
