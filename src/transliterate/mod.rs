//! Han-to-pinyin transliteration with a boundary map back to the source.
//!
//! Latin letters and digits pass through lower-cased, one letter each. Han
//! characters expand to their tone-free pinyin syllable, taken from the
//! readings override table first and the `pinyin` crate otherwise.
//! Anything without a reading contributes itself as a literal letter.

mod config;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use pinyin::ToPinyin;
use tracing::{debug, debug_span};

use crate::boundary::BoundaryMap;
use crate::unicode::{fold_fullwidth, is_han, is_latin_alnum};

pub use config::{parse_readings_toml, ReadingsError};

pub const DEFAULT_READINGS_TOML: &str = include_str!("default_readings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Phonetic rendering of a text together with its boundary map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transliteration {
    letters: Vec<char>,
    map: BoundaryMap,
}

impl Transliteration {
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn phonetic(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn map(&self) -> &BoundaryMap {
        &self.map
    }

    /// Number of characters in the source text.
    pub fn source_len(&self) -> usize {
        self.map.source_len()
    }

    pub fn phonetic_len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

pub struct Transliterator {
    readings: BTreeMap<char, String>,
}

impl Transliterator {
    /// Get or initialize the global singleton.
    ///
    /// Uses the TOML installed by [`Transliterator::init_custom`] if any,
    /// otherwise the embedded default readings.
    pub fn global() -> &'static Transliterator {
        static INSTANCE: OnceLock<Transliterator> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let toml_str = CUSTOM_TOML
                .get()
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_READINGS_TOML);
            Transliterator::from_toml(toml_str).expect("readings TOML must be valid")
        })
    }

    /// Set a custom readings TOML before the first `global()` call.
    pub fn init_custom(toml_content: String) -> Result<(), ReadingsError> {
        parse_readings_toml(&toml_content)?;
        CUSTOM_TOML
            .set(toml_content)
            .map_err(|_| ReadingsError::AlreadyInitialized)
    }

    /// Read a readings TOML file and install it via [`Transliterator::init_custom`].
    pub fn init_custom_from_file(path: &Path) -> Result<(), ReadingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::init_custom(content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ReadingsError> {
        Ok(Self::with_readings(parse_readings_toml(toml_str)?))
    }

    pub fn with_readings(readings: BTreeMap<char, String>) -> Self {
        Self { readings }
    }

    /// Tone-free reading of a single character, if it has one.
    pub fn reading(&self, c: char) -> Option<&str> {
        if let Some(r) = self.readings.get(&c) {
            return Some(r.as_str());
        }
        if !is_han(c) {
            return None;
        }
        c.to_pinyin().map(|p| p.plain())
    }

    /// Append the phonetic letters for `c` and return how many were added.
    fn push_letters(&self, c: char, out: &mut Vec<char>) -> usize {
        let c = fold_fullwidth(c);
        if is_latin_alnum(c) {
            out.push(c.to_ascii_lowercase());
            return 1;
        }
        let before = out.len();
        match self.reading(c) {
            Some(syllable) if !syllable.is_empty() => out.extend(syllable.chars()),
            _ => out.extend(c.to_lowercase()),
        }
        if out.len() == before {
            out.push(c);
        }
        out.len() - before
    }

    /// Transliterate `text`, recording which phonetic letters each
    /// original character produced.
    pub fn transliterate(&self, text: &str) -> Transliteration {
        let _span = debug_span!("transliterate", chars = text.chars().count()).entered();
        let mut letters = Vec::with_capacity(text.len());
        let mut map = BoundaryMap::default();
        for c in text.chars() {
            let n = self.push_letters(c, &mut letters);
            map.push(n);
        }
        debug!(phonetic_len = letters.len());
        Transliteration { letters, map }
    }

    /// Flat phonetic form of a query: lower-cased, whitespace removed,
    /// every remaining character transliterated.
    pub fn phonetic_query(&self, query: &str) -> Vec<char> {
        let mut letters = Vec::with_capacity(query.len());
        for c in query.chars() {
            if fold_fullwidth(c).is_whitespace() {
                continue;
            }
            self.push_letters(c, &mut letters);
        }
        letters
    }
}

/// Transliterate with the global [`Transliterator`].
pub fn transliterate(text: &str) -> Transliteration {
    Transliterator::global().transliterate(text)
}

/// Query phonetics with the global [`Transliterator`].
pub fn phonetic_query(query: &str) -> Vec<char> {
    Transliterator::global().phonetic_query(query)
}
