// File: src/core/phonetic.rs
use crate::core::converter::{detect_script, Script, Transliterator};

/// Reduces a normalized name to a spelling-tolerant code.
///
/// Per word: romanize if needed, fold equivalent clusters ("sh"/"s", "w"/"v",
/// aspirates), collapse doubled letters, keep the first letter (a leading
/// vowel becomes `A`) and drop the remaining vowels. Word codes are joined by
/// single spaces. Deterministic and total, but not idempotent.
pub struct PhoneticEncoder {
    transliterator: Transliterator,
    max_token_code_len: usize,
    max_tokens: usize,
}

impl PhoneticEncoder {
    pub fn new(max_token_code_len: usize, max_tokens: usize) -> Self {
        Self {
            transliterator: Transliterator::new(),
            max_token_code_len,
            max_tokens,
        }
    }

    pub fn encode(&self, normalized: &str) -> String {
        self.encode_tokens(normalized).join(" ")
    }

    /// Word codes in order, skipping words that reduce to nothing.
    pub fn encode_tokens(&self, normalized: &str) -> Vec<String> {
        normalized
            .split_whitespace()
            .filter_map(|word| {
                let code = match detect_script(word) {
                    Script::Devanagari => self.encode_word(&self.transliterator.to_roman(word)),
                    Script::Roman => self.encode_word(word),
                };
                if code.is_empty() { None } else { Some(code) }
            })
            .take(self.max_tokens)
            .collect()
    }

    fn encode_word(&self, word: &str) -> String {
        let letters: Vec<char> = word
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let folded = fold_clusters(&letters);

        let mut collapsed: Vec<char> = Vec::with_capacity(folded.len());
        for c in folded {
            if collapsed.last() != Some(&c) {
                collapsed.push(c);
            }
        }

        let mut code = String::with_capacity(self.max_token_code_len);
        for (i, &c) in collapsed.iter().enumerate() {
            if code.len() == self.max_token_code_len {
                break;
            }
            if i == 0 {
                code.push(if is_vowel(c) { 'A' } else { c.to_ascii_uppercase() });
            } else if !is_vowel(c) {
                code.push(c.to_ascii_uppercase());
            }
        }
        code
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Maps letters onto the reduced alphabet, longest cluster first.
fn fold_clusters(letters: &[char]) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(letters.len());
    let mut i = 0;
    while i < letters.len() {
        let consumed = match &letters[i..] {
            ['c', 'h', 'h', ..] => { out.push('c'); 3 }
            ['c', 'h', ..] => { out.push('c'); 2 }
            ['c', 'k', ..] => { out.push('k'); 2 }
            ['s', 'h', ..] => { out.push('s'); 2 }
            ['p', 'h', ..] => { out.push('f'); 2 }
            [a @ ('k' | 'g' | 'j' | 't' | 'd' | 'b'), 'h', ..] => { out.push(*a); 2 }
            ['c' | 'q', ..] => { out.push('k'); 1 }
            ['x', ..] => { out.extend(['k', 's']); 1 }
            ['z', ..] => { out.push('j'); 1 }
            ['w', ..] => { out.push('v'); 1 }
            // A stray aspirate after a consonant is silent.
            ['h', ..] if out.last().map_or(false, |&p| !is_vowel(p)) => 1,
            [c, ..] => { out.push(*c); 1 }
            [] => break,
        };
        i += consumed;
    }
    out
}
