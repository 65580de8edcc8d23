// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod feedback;
pub mod fuzzy;
pub mod persistence;
pub mod server;

pub use crate::core::engine::MatchEngine;
pub use crate::error::{MatchError, Result};
