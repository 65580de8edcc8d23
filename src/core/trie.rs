// --- File: src/core/trie.rs
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Ordered so a pre-order walk yields completions lexicographically.
    children: BTreeMap<char, usize>,
    /// Texts ending here, or, at the depth cap, every text sharing this path.
    terms: BTreeSet<String>,
}

/// A char trie over suggestion texts with a capped depth.
///
/// Texts longer than `max_depth` chars are parked, sorted, at the capped node;
/// lookups past the cap filter those by the full prefix. Every prefix of a
/// text up to the cap is therefore reachable in O(prefix) steps.
#[derive(Debug, Clone)]
pub struct PrefixTrie {
    nodes: Vec<TrieNode>,
    max_depth: usize,
    len: usize,
}

impl PrefixTrie {
    pub fn new(max_depth: usize) -> Self {
        Self { nodes: vec![TrieNode::default()], max_depth: max_depth.max(1), len: 0 }
    }

    /// Inserts a text; duplicates are ignored. O(min(k, max_depth)).
    /// Returns whether the text was new.
    pub fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let mut node_idx = 0;
        for ch in text.chars().take(self.max_depth) {
            let next_idx = if let Some(&id) = self.nodes[node_idx].children.get(&ch) {
                id
            } else {
                let new_node_id = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node_idx].children.insert(ch, new_node_id);
                new_node_id
            };
            node_idx = next_idx;
        }
        let added = self.nodes[node_idx].terms.insert(text.to_string());
        if added {
            self.len += 1;
        }
        added
    }

    pub fn contains(&self, text: &str) -> bool {
        self.find_node(text).map_or(false, |idx| self.nodes[idx].terms.contains(text))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Up to `limit` texts starting with `prefix`, lexicographically ordered.
    /// The walk stops as soon as `limit` texts are collected.
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<String> {
        let mut out = Vec::new();
        if limit == 0 {
            return out;
        }
        if let Some(idx) = self.find_node(prefix) {
            self.dfs_collect(idx, prefix, limit, &mut out);
        }
        out
    }

    fn find_node(&self, text: &str) -> Option<usize> {
        let mut node_idx = 0;
        for ch in text.chars().take(self.max_depth) {
            node_idx = *self.nodes[node_idx].children.get(&ch)?;
        }
        Some(node_idx)
    }

    fn dfs_collect(&self, node_idx: usize, prefix: &str, limit: usize, out: &mut Vec<String>) {
        let node = &self.nodes[node_idx];
        for term in node.terms.iter().filter(|t| t.starts_with(prefix)) {
            if out.len() == limit {
                return;
            }
            out.push(term.clone());
        }
        for &child_idx in node.children.values() {
            if out.len() == limit {
                return;
            }
            self.dfs_collect(child_idx, prefix, limit, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(words: &[&str], depth: usize) -> PrefixTrie {
        let mut t = PrefixTrie::new(depth);
        for w in words {
            t.insert(w);
        }
        t
    }

    #[test]
    fn completions_are_sorted_and_deduplicated() {
        let t = trie(&["suresh kumar", "sunil", "suresh", "sunil", "ramesh", "su"], 12);
        assert_eq!(t.len(), 5);
        assert_eq!(t.complete("su", 10), vec!["su", "sunil", "suresh", "suresh kumar"]);
        assert_eq!(t.complete("su", 2), vec!["su", "sunil"]);
        assert!(t.complete("x", 10).is_empty());
        assert!(t.complete("su", 0).is_empty());
    }

    #[test]
    fn prefixes_past_the_depth_cap_filter_parked_texts() {
        let t = trie(&["suresh kumar", "suresh kapoor", "suresh", "surendra"], 3);
        assert_eq!(t.complete("sur", 10), vec!["surendra", "suresh", "suresh kapoor", "suresh kumar"]);
        assert_eq!(t.complete("suresh k", 10), vec!["suresh kapoor", "suresh kumar"]);
        assert!(t.contains("suresh kapoor"));
        assert!(!t.contains("suresh k"));
    }

    #[test]
    fn devanagari_prefixes() {
        let t = trie(&["सुरेश कुमार", "सुनील"], 12);
        assert_eq!(t.complete("सु", 10), vec!["सुनील", "सुरेश कुमार"]);
    }

    #[test]
    fn empty_prefix_lists_everything_in_order() {
        let t = trie(&["b", "a", "ab"], 12);
        assert_eq!(t.complete("", 10), vec!["a", "ab", "b"]);
    }
}
