pub mod converter;
pub mod engine;
pub mod index;
pub mod normalizer;
pub mod phonetic;
pub mod scorer;
pub mod trie;
pub mod types;
