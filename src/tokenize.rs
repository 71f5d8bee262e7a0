//! Dictionary tokeniser: raw text → symbol-table ids.
//!
//! 1. Every whitespace run collapses to one literal space.
//! 2. A scanner splits the text into segments, preferring at each position
//!    an ASCII letter run, then an ASCII digit run, then a single
//!    punctuation character, then a whitespace run.
//! 3. Segments map to ids: space → space id; a segment that is itself a
//!    symbol → its id; otherwise the lowercased segment's first dictionary
//!    pronunciation, or one id per character when the word is unknown.
//! 4. Trailing space ids are stripped.
//!
//! Units absent from the symbol table become the OOV id, or are silently
//! dropped when the table has no OOV symbol.  Encoding never fails.

use std::path::Path;

use crate::{
    dictionary::PronunciationDictionary,
    error::{TtsError, TtsResult},
    symbols::{SymbolTable, TokenId},
};

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// One unit of segmented text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Maximal run of ASCII letters.
    Word(&'a str),
    /// Maximal run of ASCII digits.
    Number(&'a str),
    /// A single character that is not an ASCII letter, ASCII digit or whitespace.
    Punct(&'a str),
    /// Maximal whitespace run.
    Space,
}

/// Collapse each maximal whitespace run (tabs and newlines included) into a
/// single `' '`.  Leading and trailing runs are kept.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Left-to-right segmentation of `text`; every character lands in exactly
/// one segment.
pub fn segments(text: &str) -> Segments<'_> {
    Segments { text, pos: 0 }
}

/// Iterator returned by [`segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Segments<'a> {
    /// Byte offset just past the run of chars matching `pred` starting at `self.pos`.
    fn run_end(&self, pred: impl Fn(char) -> bool) -> usize {
        self.text[self.pos..]
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.text.len(), |(i, _)| self.pos + i)
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let first = self.text[self.pos..].chars().next()?;
        let start = self.pos;

        let (end, segment) = if first.is_ascii_alphabetic() {
            let end = self.run_end(|c| c.is_ascii_alphabetic());
            (end, Segment::Word(&self.text[start..end]))
        } else if first.is_ascii_digit() {
            let end = self.run_end(|c| c.is_ascii_digit());
            (end, Segment::Number(&self.text[start..end]))
        } else if !first.is_whitespace() {
            let end = start + first.len_utf8();
            (end, Segment::Punct(&self.text[start..end]))
        } else {
            (self.run_end(char::is_whitespace), Segment::Space)
        };

        self.pos = end;
        Some(segment)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Symbol table plus pronunciation dictionary, both immutable after load.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    symbols: SymbolTable,
    dictionary: PronunciationDictionary,
}

impl Tokenizer {
    pub fn new(symbols: SymbolTable, dictionary: PronunciationDictionary) -> Self {
        Self { symbols, dictionary }
    }

    /// Load `tokens.txt` and `cmudict.json`.
    ///
    /// Fails with `InvalidTokensFile` or `InvalidDictionaryFile`; callers that
    /// build a whole engine wrap these in `TokenizerInitializationFailed`.
    pub fn load(tokens_path: &Path, dictionary_path: &Path) -> TtsResult<Self> {
        let symbols = SymbolTable::load(tokens_path)?;
        let dictionary = PronunciationDictionary::load(dictionary_path)?;
        Ok(Self::new(symbols, dictionary))
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn dictionary(&self) -> &PronunciationDictionary {
        &self.dictionary
    }

    /// Encode `text` into token ids.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        let normalized = normalize_whitespace(text);
        let mut ids = Vec::with_capacity(normalized.len());

        for segment in segments(&normalized) {
            match segment {
                Segment::Space => ids.extend(self.symbols.space_id()),
                Segment::Word(s) | Segment::Number(s) | Segment::Punct(s) => {
                    self.push_segment(s, &mut ids)
                }
            }
        }

        if let Some(space) = self.symbols.space_id() {
            while ids.last() == Some(&space) {
                ids.pop();
            }
        }
        ids
    }

    fn push_segment(&self, segment: &str, ids: &mut Vec<TokenId>) {
        if let Some(id) = self.symbols.id_of(segment) {
            ids.push(id);
            return;
        }

        let word = segment.to_lowercase();
        match self.dictionary.first_pronunciation(&word) {
            Some(phonemes) => {
                for phoneme in phonemes {
                    self.push_unit(phoneme, ids);
                }
            }
            None => {
                let mut buf = [0u8; 4];
                for ch in word.chars() {
                    self.push_unit(ch.encode_utf8(&mut buf), ids);
                }
            }
        }
    }

    /// Resolve one phoneme/character: its own id, else OOV, else nothing.
    fn push_unit(&self, unit: &str, ids: &mut Vec<TokenId>) {
        if let Some(id) = self.symbols.id_of(unit).or(self.symbols.oov_id()) {
            ids.push(id);
        }
    }

    /// Map ids back to their symbols and concatenate them (debugging aid).
    /// Ids outside the table are skipped.
    pub fn decode(&self, ids: &[TokenId]) -> String {
        ids.iter()
            .filter_map(|&id| self.symbols.symbol_of(id))
            .collect()
    }
}

/// Build a tokenizer from in-memory sources, mainly for tests and embedding.
impl TryFrom<(&str, &str)> for Tokenizer {
    type Error = TtsError;

    fn try_from((tokens, dictionary_json): (&str, &str)) -> TtsResult<Self> {
        Ok(Self::new(
            SymbolTable::parse(tokens),
            PronunciationDictionary::from_json(dictionary_json)?,
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tokenizer {
        Tokenizer::new(
            SymbolTable::from_symbols(["<oov>", " ", "a", "b", "!"]),
            PronunciationDictionary::from_json(r#"{"ab": [["a","b"]]}"#).unwrap(),
        )
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a \t\n b"), "a b");
        assert_eq!(normalize_whitespace("  a  "), " a ");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_segment_precedence() {
        let segs: Vec<_> = segments("Ab12!? x").collect();
        assert_eq!(
            segs,
            vec![
                Segment::Word("Ab"),
                Segment::Number("12"),
                Segment::Punct("!"),
                Segment::Punct("?"),
                Segment::Space,
                Segment::Word("x"),
            ]
        );
    }

    #[test]
    fn test_non_ascii_is_single_punct() {
        let segs: Vec<_> = segments("café").collect();
        assert_eq!(segs, vec![Segment::Word("caf"), Segment::Punct("é")]);
    }

    #[test]
    fn test_dictionary_word_and_punctuation() {
        assert_eq!(sample().encode("Ab!  ab"), vec![2, 3, 4, 1, 2, 3]);
    }

    #[test]
    fn test_unknown_word_falls_back_to_oov_chars() {
        assert_eq!(sample().encode("xy "), vec![0, 0]);
    }

    #[test]
    fn test_trailing_space_stripped() {
        let tok = sample();
        assert_eq!(tok.encode("ab   "), tok.encode("ab"));
        assert_eq!(tok.encode("ab\n\t"), vec![2, 3]);
    }

    #[test]
    fn test_leading_space_kept() {
        assert_eq!(sample().encode("  ab"), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        let tok = sample();
        assert!(tok.encode("").is_empty());
        assert!(tok.encode(" \t\n ").is_empty());
    }

    #[test]
    fn test_first_variant_only() {
        let tok = Tokenizer::new(
            SymbolTable::from_symbols([" ", "a", "b"]),
            PronunciationDictionary::from_json(r#"{"x": [["a"], ["b"]]}"#).unwrap(),
        );
        assert_eq!(tok.encode("x X"), vec![1, 0, 1]);
    }

    #[test]
    fn test_known_symbol_wins_over_dictionary() {
        // "a" is a symbol itself, so the dictionary is never consulted for it.
        let tok = Tokenizer::new(
            SymbolTable::from_symbols(["a", "b"]),
            PronunciationDictionary::from_json(r#"{"a": [["b"]]}"#).unwrap(),
        );
        assert_eq!(tok.encode("a"), vec![0]);
        assert_eq!(tok.encode("A"), vec![1]);
    }

    #[test]
    fn test_digits_decompose_per_character() {
        let tok = Tokenizer::new(SymbolTable::from_symbols(["1", "2"]), Default::default());
        assert_eq!(tok.encode("12"), vec![0, 1]);
    }

    #[test]
    fn test_no_oov_drops_silently() {
        let tok = Tokenizer::new(
            SymbolTable::from_symbols([" ", "a"]),
            PronunciationDictionary::from_json(r#"{"q": [["zz", "a"]]}"#).unwrap(),
        );
        assert_eq!(tok.encode("q ?x a"), vec![1, 0, 0, 1]);
        assert!(tok.encode("???").is_empty());
    }

    #[test]
    fn test_no_space_symbol_drops_spaces() {
        let tok = Tokenizer::new(SymbolTable::from_symbols(["a", "b"]), Default::default());
        assert_eq!(tok.encode("a b "), vec![0, 1]);
        assert!(tok.encode("   ").is_empty());
    }

    #[test]
    fn test_unknown_phoneme_becomes_oov() {
        let tok = Tokenizer::new(
            SymbolTable::from_symbols(["<oov>", "a"]),
            PronunciationDictionary::from_json(r#"{"w": [["a", "AH0"]]}"#).unwrap(),
        );
        assert_eq!(tok.encode("w"), vec![1, 0]);
    }

    #[test]
    fn test_decode() {
        let tok = sample();
        assert_eq!(tok.decode(&tok.encode("Ab! ab")), "ab! ab");
        assert_eq!(tok.decode(&[2, 99, 3]), "ab");
    }

    #[test]
    fn test_try_from_sources() {
        let tok = Tokenizer::try_from(("<oov>\n \na\nb\n!\n", r#"{"ab": [["a","b"]]}"#)).unwrap();
        assert_eq!(tok.encode("Ab!  ab"), vec![2, 3, 4, 1, 2, 3]);
        assert!(Tokenizer::try_from(("a", "[]")).is_err());
    }
}
