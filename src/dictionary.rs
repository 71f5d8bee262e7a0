//! Pronunciation dictionary (`cmudict.json`).
//!
//! A JSON object mapping lowercase words to their pronunciation variants:
//!
//! ```json
//! { "hello": [["HH", "AH0", "L", "OW1"], ["HH", "EH0", "L", "OW1"]] }
//! ```
//!
//! Phonemes are *not* checked against the symbol table here; unknown ones are
//! resolved (OOV or dropped) by the tokeniser at encode time.

use std::{collections::HashMap, path::Path};

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Word → pronunciation variants, each an ordered phoneme list.
#[derive(Debug, Clone, Default)]
pub struct PronunciationDictionary {
    entries: HashMap<String, Vec<Vec<String>>>,
}

impl PronunciationDictionary {
    /// Load and parse a dictionary file.
    pub fn load(path: &Path) -> TtsResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot read dictionary file");
            TtsError::InvalidDictionaryFile
        })?;
        let dict = Self::from_slice(&bytes)?;
        debug!(path = %path.display(), words = dict.len(), "loaded pronunciation dictionary");
        Ok(dict)
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json(json: &str) -> TtsResult<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Parse raw JSON bytes.  Anything other than an object of
    /// array-of-array-of-string is rejected as a whole.
    pub fn from_slice(bytes: &[u8]) -> TtsResult<Self> {
        let entries: HashMap<String, Vec<Vec<String>>> =
            serde_json::from_slice(bytes).map_err(|e| {
                debug!(error = %e, "malformed dictionary JSON");
                TtsError::InvalidDictionaryFile
            })?;
        Ok(Self { entries })
    }

    /// All variants for `word` (already lowercased by the caller).
    pub fn variants(&self, word: &str) -> Option<&[Vec<String>]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    /// The first listed pronunciation.  No heteronym or stress selection is
    /// attempted; a word with an empty variant list has no pronunciation.
    pub fn first_pronunciation(&self, word: &str) -> Option<&[String]> {
        self.entries
            .get(word)
            .and_then(|variants| variants.first())
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<Vec<String>>)> for PronunciationDictionary {
    fn from_iter<T: IntoIterator<Item = (String, Vec<Vec<String>>)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
