//! Symbol table: the id assignment consumed by the acoustic model.
//!
//! `tokens.txt` lists one symbol per line.  The n-th *non-empty* line gets id
//! `n`; blank lines are skipped and do not consume an id.  Two symbols are
//! well known: the literal space `" "` and the out-of-vocabulary marker
//! `"<oov>"`.  Either may be absent, in which case the tokeniser drops the
//! units that would have needed it.

use std::{collections::HashMap, path::Path};

use tracing::debug;

use crate::error::{TtsError, TtsResult};

/// Index of a row in the [`SymbolTable`].
pub type TokenId = u32;

/// The literal space symbol.
pub const SPACE: &str = " ";

/// Out-of-vocabulary symbol.
pub const OOV: &str = "<oov>";

/// Immutable symbol ↔ id mapping.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<String>,
    ids: HashMap<String, TokenId>,
    space: Option<TokenId>,
    oov: Option<TokenId>,
}

impl SymbolTable {
    /// Read a symbol table from a newline-delimited UTF-8 file.
    pub fn load(path: &Path) -> TtsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot read tokens file");
            TtsError::InvalidTokensFile
        })?;
        let table = Self::parse(&text);
        debug!(path = %path.display(), symbols = table.len(), "loaded symbol table");
        Ok(table)
    }

    /// Build a table from the file contents.  Never fails: any text is a
    /// valid (possibly empty) symbol list.
    pub fn parse(text: &str) -> Self {
        Self::from_symbols(
            text.split(['\n', '\r'])
                .filter(|line| !line.is_empty())
                .map(str::to_owned),
        )
    }

    /// Build a table from symbols in id order.
    ///
    /// A repeated symbol keeps consuming ids, but lookups resolve to its
    /// last occurrence.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let ids: HashMap<String, TokenId> = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as TokenId))
            .collect();
        let space = ids.get(SPACE).copied();
        let oov = ids.get(OOV).copied();
        Self { symbols, ids, space, oov }
    }

    pub fn id_of(&self, symbol: &str) -> Option<TokenId> {
        self.ids.get(symbol).copied()
    }

    /// Reverse lookup, used for debugging token streams.
    pub fn symbol_of(&self, id: TokenId) -> Option<&str> {
        self.symbols.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.ids.contains_key(symbol)
    }

    /// Id of the literal space symbol, if the table defines one.
    pub fn space_id(&self) -> Option<TokenId> {
        self.space
    }

    /// Id of [`OOV`], if the table defines one.
    pub fn oov_id(&self) -> Option<TokenId> {
        self.oov
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
