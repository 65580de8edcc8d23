// File: src/core/converter.rs
//! Roman <-> Devanagari transliteration.
//!
//! Both directions are lossy: Roman spelling of a Devanagari name is ambiguous
//! (ि/ी both read back as "i", त/ट both as "t") and vice versa. Round trips are
//! close, not exact. Characters with no mapping pass through unchanged.

use crate::core::normalizer::is_devanagari;
use std::collections::HashMap;

const HALANTA: char = '\u{094d}';
const NUKTA: char = '\u{093c}';
const ANUSVARA: char = '\u{0902}';
const CHANDRABINDU: char = '\u{0901}';
const VISARGA: char = '\u{0903}';

/// Whole-word spellings the rules get wrong. Checked before the rules in both
/// directions; for Devanagari -> Roman the first Roman spelling listed wins.
const LEXICON: &[(&str, &str)] = &[
    ("ram", "राम"),
    ("shyam", "श्याम"),
    ("singh", "सिंह"),
    ("krishna", "कृष्ण"),
    ("lakshmi", "लक्ष्मी"),
    ("laxmi", "लक्ष्मी"),
    ("gyan", "ज्ञान"),
    ("mohan", "मोहन"),
    ("kamal", "कमल"),
    ("sagar", "सागर"),
    ("amar", "अमर"),
    ("ratan", "रतन"),
    ("pawan", "पवन"),
    ("aman", "अमन"),
    ("karan", "करन"),
    ("yadav", "यादव"),
    ("sanjay", "संजय"),
    ("sita", "सीता"),
    ("gita", "गीता"),
    ("geeta", "गीता"),
    ("sunil", "सुनील"),
    ("anand", "आनंद"),
    ("chandra", "चंद्र"),
    ("mohammad", "मोहम्मद"),
    ("thakur", "ठाकुर"),
    ("pandey", "पांडे"),
    ("patel", "पटेल"),
    ("rathore", "राठौर"),
];

/// Script of a piece of text, decided by majority of letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Roman,
    Devanagari,
}

pub fn detect_script(text: &str) -> Script {
    let (mut deva, mut latin) = (0usize, 0usize);
    for ch in text.chars() {
        if is_devanagari(ch) {
            deva += 1;
        } else if ch.is_alphabetic() {
            latin += 1;
        }
    }
    if deva > latin {
        Script::Devanagari
    } else {
        Script::Roman
    }
}

#[derive(Debug, Clone, Copy)]
enum RomanUnit {
    /// Independent letter and, for all but the inherent "a", its vowel sign.
    Vowel { independent: char, sign: Option<char> },
    Consonant(&'static str),
}

/// A mapped Roman unit, or a char with no mapping.
#[derive(Debug, Clone, Copy)]
enum Token {
    Unit(RomanUnit),
    Other(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Nucleus {
    Inherent,
    Sign(&'static str),
    Killed,
    Dropped,
}

#[derive(Debug, Clone)]
struct Syllable {
    onset: Option<&'static str>,
    nucleus: Nucleus,
    coda: Option<char>,
}

impl Syllable {
    fn has_vowel(&self) -> bool {
        matches!(self.nucleus, Nucleus::Inherent | Nucleus::Sign(_)) || self.coda.is_some()
    }
}

/// A stateless Roman <-> Devanagari converter with a small name lexicon.
pub struct Transliterator {
    lexicon: HashMap<&'static str, &'static str>,
    reverse_lexicon: HashMap<&'static str, &'static str>,
}

impl Default for Transliterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Transliterator {
    pub fn new() -> Self {
        let mut lexicon = HashMap::new();
        let mut reverse_lexicon = HashMap::new();
        for &(roman, deva) in LEXICON {
            lexicon.insert(roman, deva);
            reverse_lexicon.entry(deva).or_insert(roman);
        }
        Self { lexicon, reverse_lexicon }
    }

    /// Transliterates lowercase Roman text word by word.
    pub fn to_devanagari(&self, roman: &str) -> String {
        roman
            .split(' ')
            .map(|word| match self.lexicon.get(word) {
                Some(deva) => deva.to_string(),
                None => self.word_to_devanagari(word),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Transliterates Devanagari text word by word, applying schwa deletion.
    pub fn to_roman(&self, devanagari: &str) -> String {
        devanagari
            .split(' ')
            .map(|word| match self.reverse_lexicon.get(word) {
                Some(roman) => roman.to_string(),
                None => self.word_to_roman(word),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Longest-match-first tokenization: "chh" before "ch" before "c".
    fn tokenize(&self, word: &str) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(word.len());
        let mut i = 0;
        'outer: while i < word.len() {
            for len in (1..=3).rev() {
                let end = i + len;
                if end > word.len() || !word.is_char_boundary(end) {
                    continue;
                }
                if let Some(unit) = self.roman_unit(&word[i..end]) {
                    tokens.push(Token::Unit(unit));
                    i = end;
                    continue 'outer;
                }
            }
            let ch = word[i..].chars().next().unwrap_or('\u{fffd}');
            tokens.push(Token::Other(ch));
            i += ch.len_utf8();
        }
        tokens
    }

    fn word_to_devanagari(&self, word: &str) -> String {
        let tokens = self.tokenize(word);
        let mut result = String::new();
        let mut last_was_consonant = false;

        for (pos, token) in tokens.iter().enumerate() {
            match *token {
                Token::Unit(RomanUnit::Consonant(cons)) => {
                    if last_was_consonant {
                        result.push(HALANTA);
                    }
                    result.push_str(cons);
                    last_was_consonant = true;
                }
                Token::Unit(RomanUnit::Vowel { independent, sign }) => {
                    if last_was_consonant {
                        match sign {
                            Some(sign) => result.push(sign),
                            None if self.lengthens_final_a(&tokens, pos) => result.push('ा'),
                            None => {}
                        }
                    } else {
                        result.push(independent);
                    }
                    last_was_consonant = false;
                }
                Token::Other(c) => {
                    if !c.is_ascii_digit() {
                        tracing::debug!("transliteration gap: {:?} in {:?}", c, word);
                    }
                    result.push(c);
                    last_was_consonant = false;
                }
            }
        }

        // A trailing consonant keeps its inherent vowel: no halanta is written.
        result
    }

    /// A short "a" after a consonant is written long when it ends the word
    /// ("sharma") or precedes a word-final र, श or स ("kumar", "prakash").
    fn lengthens_final_a(&self, tokens: &[Token], pos: usize) -> bool {
        match &tokens[pos + 1..] {
            [] => true,
            [Token::Unit(RomanUnit::Consonant(cons))] => matches!(*cons, "र" | "श" | "स"),
            _ => false,
        }
    }

    fn word_to_roman(&self, word: &str) -> String {
        let mut out = String::new();
        let mut syllables: Vec<Syllable> = Vec::new();

        for ch in word.chars() {
            if let Some(cons) = self.consonant_roman(ch) {
                syllables.push(Syllable { onset: Some(cons), nucleus: Nucleus::Inherent, coda: None });
            } else if let Some(sign) = self.vowel_sign_roman(ch) {
                match syllables.last_mut() {
                    Some(last) if last.onset.is_some() && last.nucleus == Nucleus::Inherent => {
                        last.nucleus = Nucleus::Sign(sign);
                    }
                    _ => syllables.push(Syllable { onset: None, nucleus: Nucleus::Sign(sign), coda: None }),
                }
            } else if let Some(vowel) = self.independent_vowel_roman(ch) {
                syllables.push(Syllable { onset: None, nucleus: Nucleus::Sign(vowel), coda: None });
            } else if ch == HALANTA {
                if let Some(last) = syllables.last_mut() {
                    last.nucleus = Nucleus::Killed;
                }
            } else if matches!(ch, ANUSVARA | CHANDRABINDU | VISARGA) {
                match syllables.last_mut() {
                    Some(last) => last.coda = Some(ch),
                    None => syllables.push(Syllable { onset: None, nucleus: Nucleus::Dropped, coda: Some(ch) }),
                }
            } else if ch == NUKTA {
                // क़ reads as क
            } else {
                self.render_syllables(&mut syllables, &mut out);
                match devanagari_digit(ch) {
                    Some(d) => out.push(d),
                    None => {
                        if is_devanagari(ch) {
                            tracing::debug!("transliteration gap: {:?} in {:?}", ch, word);
                        }
                        out.push(ch);
                    }
                }
            }
        }
        self.render_syllables(&mut syllables, &mut out);
        out
    }

    /// Applies schwa deletion to a run of syllables, then appends their Roman
    /// rendering. The inherent vowel drops word-finally (unless it follows a
    /// conjunct) and medially in a V C _ C V context, scanned right to left.
    fn render_syllables(&self, syllables: &mut Vec<Syllable>, out: &mut String) {
        let n = syllables.len();
        for i in (0..n).rev() {
            let s = &syllables[i];
            if s.nucleus != Nucleus::Inherent || s.onset.is_none() || s.coda.is_some() {
                continue;
            }
            let drop = if i == n - 1 {
                n > 1 && syllables[i - 1].nucleus != Nucleus::Killed
            } else if i == 0 {
                false
            } else {
                let next = &syllables[i + 1];
                syllables[i - 1].has_vowel() && next.onset.is_some() && next.has_vowel()
            };
            if drop {
                syllables[i].nucleus = Nucleus::Dropped;
            }
        }

        for (i, s) in syllables.iter().enumerate() {
            if let Some(onset) = s.onset {
                out.push_str(onset);
            }
            match s.nucleus {
                Nucleus::Inherent => out.push('a'),
                Nucleus::Sign(v) => out.push_str(v),
                Nucleus::Killed | Nucleus::Dropped => {}
            }
            match s.coda {
                Some(VISARGA) => out.push('h'),
                Some(_) => {
                    let labial = syllables
                        .get(i + 1)
                        .and_then(|next| next.onset)
                        .map_or(false, |o| matches!(o, "p" | "ph" | "b" | "bh" | "m"));
                    out.push(if labial { 'm' } else { 'n' });
                }
                None => {}
            }
        }
        syllables.clear();
    }

    fn roman_unit(&self, s: &str) -> Option<RomanUnit> {
        use RomanUnit::{Consonant, Vowel};
        let unit = match s {
            "aa" => Vowel { independent: 'आ', sign: Some('ा') },
            "a" => Vowel { independent: 'अ', sign: None },
            "ii" | "ee" => Vowel { independent: 'ई', sign: Some('ी') },
            "i" => Vowel { independent: 'इ', sign: Some('ि') },
            "uu" | "oo" => Vowel { independent: 'ऊ', sign: Some('ू') },
            "u" => Vowel { independent: 'उ', sign: Some('ु') },
            "e" => Vowel { independent: 'ए', sign: Some('े') },
            "ai" => Vowel { independent: 'ऐ', sign: Some('ै') },
            "o" => Vowel { independent: 'ओ', sign: Some('ो') },
            "au" => Vowel { independent: 'औ', sign: Some('ौ') },

            "ksh" => Consonant("क्ष"),
            "chh" => Consonant("छ"),
            "kh" => Consonant("ख"),
            "gh" => Consonant("घ"),
            "ch" => Consonant("च"),
            "jh" => Consonant("झ"),
            "th" => Consonant("थ"),
            "dh" => Consonant("ध"),
            "ph" => Consonant("फ"),
            "bh" => Consonant("भ"),
            "sh" => Consonant("श"),
            "k" | "c" | "q" => Consonant("क"),
            "g" => Consonant("ग"),
            "j" | "z" => Consonant("ज"),
            "t" => Consonant("त"),
            "d" => Consonant("द"),
            "n" => Consonant("न"),
            "p" => Consonant("प"),
            "f" => Consonant("फ"),
            "b" => Consonant("ब"),
            "m" => Consonant("म"),
            "y" => Consonant("य"),
            "r" => Consonant("र"),
            "l" => Consonant("ल"),
            "v" | "w" => Consonant("व"),
            "s" => Consonant("स"),
            "h" => Consonant("ह"),
            "x" => Consonant("क्स"),
            _ => return None,
        };
        Some(unit)
    }

    fn consonant_roman(&self, c: char) -> Option<&'static str> {
        match c {
            'क' => Some("k"), 'ख' => Some("kh"), 'ग' => Some("g"), 'घ' => Some("gh"),
            'ङ' => Some("n"), 'च' => Some("ch"), 'छ' => Some("chh"), 'ज' => Some("j"),
            'झ' => Some("jh"), 'ञ' => Some("n"), 'ट' => Some("t"), 'ठ' => Some("th"),
            'ड' => Some("d"), 'ढ' => Some("dh"), 'ण' => Some("n"), 'त' => Some("t"),
            'थ' => Some("th"), 'द' => Some("d"), 'ध' => Some("dh"), 'न' => Some("n"),
            'प' => Some("p"), 'फ' => Some("ph"), 'ब' => Some("b"), 'भ' => Some("bh"),
            'म' => Some("m"), 'य' => Some("y"), 'र' => Some("r"), 'ल' => Some("l"),
            'ळ' => Some("l"), 'व' => Some("v"), 'श' => Some("sh"), 'ष' => Some("sh"),
            'स' => Some("s"), 'ह' => Some("h"),
            // Precomposed nukta forms, in case the input skipped normalization.
            '\u{0958}' => Some("k"), '\u{0959}' => Some("kh"), '\u{095a}' => Some("g"),
            '\u{095b}' => Some("z"), '\u{095c}' => Some("d"), '\u{095d}' => Some("dh"),
            '\u{095e}' => Some("f"), '\u{095f}' => Some("y"),
            _ => None,
        }
    }

    fn vowel_sign_roman(&self, c: char) -> Option<&'static str> {
        match c {
            'ा' => Some("a"), 'ि' => Some("i"), 'ी' => Some("i"), 'ु' => Some("u"),
            'ू' => Some("u"), 'ृ' => Some("ri"), 'े' => Some("e"), 'ै' => Some("ai"),
            'ो' => Some("o"), 'ौ' => Some("au"), 'ॉ' => Some("o"), 'ॅ' => Some("e"),
            _ => None,
        }
    }

    fn independent_vowel_roman(&self, c: char) -> Option<&'static str> {
        match c {
            'अ' => Some("a"), 'आ' => Some("a"), 'इ' => Some("i"), 'ई' => Some("i"),
            'उ' => Some("u"), 'ऊ' => Some("u"), 'ऋ' => Some("ri"), 'ए' => Some("e"),
            'ऐ' => Some("ai"), 'ओ' => Some("o"), 'औ' => Some("au"), 'ऑ' => Some("o"),
            _ => None,
        }
    }
}

fn devanagari_digit(c: char) -> Option<char> {
    match c {
        '०'..='९' => char::from_digit(c as u32 - '०' as u32, 10),
        _ => None,
    }
}
