// File: src/core/normalizer.rs
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const NUKTA: char = '\u{093c}';
const DANDA: char = '\u{0964}';
const DOUBLE_DANDA: char = '\u{0965}';

/// Canonicalizes raw name text into the matching key.
///
/// Total and idempotent: `normalize(normalize(x)) == normalize(x)`.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    honorifics: HashSet<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Honorifics are compared after normalization, so "Shri." and "SHRI" both hit "shri".
    pub fn with_honorifics<I, S>(honorifics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bare = Self::default();
        let honorifics = honorifics
            .into_iter()
            .map(|h| bare.normalize(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();
        Self { honorifics }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut cleaned = String::with_capacity(raw.len());
        for ch in raw.nfd() {
            if is_devanagari(ch) {
                match ch {
                    NUKTA => {}
                    DANDA | DOUBLE_DANDA => cleaned.push(' '),
                    _ => cleaned.push(ch),
                }
            } else if is_combining_mark(ch) {
                // Latin accents: "é" decomposes to "e" + U+0301.
            } else if ch.is_alphanumeric() {
                cleaned.extend(ch.to_lowercase().filter(|lc| !is_combining_mark(*lc)));
            } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/' {
                cleaned.push(' ');
            } else if ch == '\'' || ch == '\u{2019}' {
                // D'Souza -> dsouza
            }
            // Everything else (periods, commas, zero-width joiners, symbols) is dropped.
        }

        let words: Vec<&str> = cleaned.split_whitespace().collect();
        let kept: Vec<&str> = if self.honorifics.is_empty() {
            words
        } else {
            let names: Vec<&str> = words
                .iter()
                .copied()
                .filter(|w| !self.honorifics.contains(*w))
                .collect();
            // A name made only of honorifics keeps them.
            if names.is_empty() { words } else { names }
        };

        // Recompose so Devanagari stays in canonical form.
        kept.join(" ").nfc().collect()
    }
}

/// True for code points in the Devanagari block.
pub fn is_devanagari(ch: char) -> bool {
    ('\u{0900}'..='\u{097f}').contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::with_honorifics(["mr", "shri", "dr"])
    }

    #[test]
    fn folds_case_and_whitespace() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("  Suresh   KUMAR\t"), "suresh kumar");
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }

    #[test]
    fn strips_punctuation_and_latin_accents() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("R.K. Sharma,"), "rk sharma");
        assert_eq!(n.normalize("José-Ramón"), "jose ramon");
        assert_eq!(n.normalize("D'Souza"), "dsouza");
    }

    #[test]
    fn keeps_devanagari_vowel_signs() {
        let n = Normalizer::new();
        assert_eq!(n.normalize(" सुरेश   कुमार। "), "सुरेश कुमार");
        assert_eq!(n.normalize("क़ासिम"), "कासिम");
    }

    #[test]
    fn strips_honorifics_only_when_a_name_remains() {
        let n = normalizer();
        assert_eq!(n.normalize("Mr. Suresh Kumar"), "suresh kumar");
        assert_eq!(n.normalize("Shri Ram"), "ram");
        assert_eq!(n.normalize("Shri"), "shri");
        assert_eq!(n.normalize("Mrinal"), "mrinal");
    }

    #[test]
    fn idempotent() {
        let n = normalizer();
        for raw in ["Mr. Suresh  Kumar", "José-Ramón", "सुरेश कुमार।", "Dr Dr", "a.b.c", "  ", "Ram_Lal/Verma"] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", raw);
        }
    }
}
