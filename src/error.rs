// File: src/error.rs
//! Error taxonomy shared by the engine, the stores and the HTTP layer.
//!
//! Transliteration gaps are not errors: an unmapped character is passed
//! through and logged, never reported to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Blank query text, malformed filter value or invalid tuning parameters.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An internal index invariant was violated. Fatal to the operation that
    /// detected it, the rest of the index is left untouched.
    #[error("index inconsistency: {0}")]
    IndexInconsistency(String),

    /// The record store or the feedback log could not be written or read.
    #[error("storage unavailable: {source}")]
    StorageUnavailable {
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl MatchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MatchError::Validation(msg.into())
    }

    pub fn inconsistency(msg: impl Into<String>) -> Self {
        MatchError::IndexInconsistency(msg.into())
    }
}

impl From<std::io::Error> for MatchError {
    fn from(source: std::io::Error) -> Self {
        MatchError::StorageUnavailable { source }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
