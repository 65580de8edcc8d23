// File: src/fuzzy/symspell.rs
use std::collections::{BTreeSet, HashMap, HashSet};

/// Fuzzy key lookup based on the Symmetric Delete (SymSpell) algorithm.
///
/// Maps every delete variant of a key (e.g. "SRS" -> "RS", "SS", "SR") back to
/// the keys it came from, so keys within the edit distance of a query are found
/// without scanning the key space. Lookups are verified with a real
/// Levenshtein distance, since shared deletes over-approximate it.
#[derive(Debug, Clone, Default)]
pub struct SymSpell {
    deletes: HashMap<String, HashSet<String>>,
    max_edit_distance: usize,
}

impl SymSpell {
    pub fn new(max_edit_distance: usize) -> Self {
        Self {
            deletes: HashMap::new(),
            max_edit_distance,
        }
    }

    /// Registers `key` under all of its delete variants.
    /// Complexity: O(k^d) variants for key length k and distance d.
    pub fn add_key(&mut self, key: &str) {
        for edit in self.generate_edits(key) {
            self.deletes.entry(edit).or_default().insert(key.to_string());
        }
    }

    /// Known keys within `max_edit_distance` of `input`, in lexicographic order.
    /// Complexity is independent of the number of stored keys.
    pub fn lookup(&self, input: &str) -> BTreeSet<String> {
        let mut candidates = BTreeSet::new();
        for edit in self.generate_edits(input) {
            if let Some(keys) = self.deletes.get(&edit) {
                for key in keys {
                    if strsim::levenshtein(input, key) <= self.max_edit_distance {
                        candidates.insert(key.clone());
                    }
                }
            }
        }
        candidates
    }

    pub fn len(&self) -> usize {
        self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
    }

    /// All unique variants within `max_edit_distance` deletes, including the
    /// input itself. Works on chars so multi-byte input never splits.
    fn generate_edits(&self, word: &str) -> HashSet<String> {
        let mut edits = HashSet::new();
        edits.insert(word.to_string());

        let mut current_edits = edits.clone();
        for _ in 0..self.max_edit_distance {
            let mut next_edits = HashSet::new();
            for edit in &current_edits {
                let chars: Vec<char> = edit.chars().collect();
                for i in 0..chars.len() {
                    let variant: String = chars
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != i)
                        .map(|(_, c)| *c)
                        .collect();
                    next_edits.insert(variant);
                }
            }
            edits.extend(next_edits.iter().cloned());
            current_edits = next_edits;
        }

        edits
    }
}
