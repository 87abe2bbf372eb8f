//! `textDocument/completion` backed by a static word list.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use lsp_types::{CompletionItem, CompletionList, CompletionParams};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::{HandlerError, TypedHandler};

use super::HANDLER_TARGET;

/// Words offered as completion candidates, one per line of the source file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

/// Errors raised while reading a word list.
#[derive(Debug, Error)]
pub enum WordListError {
    /// The word list file could not be read.
    #[error("failed to read word list '{path}': {source}")]
    Read {
        /// File that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl WordList {
    /// A list with no words.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits `text` into words, one per line. Blank lines are skipped and
    /// `\r\n` line endings are accepted.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let words = text
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_owned)
            .collect();
        Self { words }
    }

    /// Reads a word list from disk.
    ///
    /// # Errors
    ///
    /// Returns [`WordListError::Read`] when the file cannot be read as UTF-8
    /// text.
    pub fn load(path: &Utf8Path) -> Result<Self, WordListError> {
        let text = fs::read_to_string(path).map_err(|source| WordListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    /// Reads a word list, falling back to an empty list when it is missing or
    /// unreadable.
    #[must_use]
    pub fn load_or_empty(path: &Utf8Path) -> Self {
        match Self::load(path) {
            Ok(words) => {
                debug!(target: HANDLER_TARGET, %path, words = words.len(), "word list loaded");
                words
            }
            Err(error) => {
                warn!(
                    target: HANDLER_TARGET,
                    %error,
                    "completion word list unavailable; serving no candidates"
                );
                Self::empty()
            }
        }
    }

    /// Number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when the list holds no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterates over the words in file order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

/// Offers every word of the list as a completion item.
///
/// Items are built once, when the handler is created; every request returns
/// the same complete list. The params only feed the request log, so params
/// that are missing, partial, or not `CompletionParams` at all are accepted.
#[derive(Debug, Clone)]
pub struct CompletionHandler {
    items: Vec<CompletionItem>,
}

impl CompletionHandler {
    /// Precomputes completion items from `words`.
    #[must_use]
    pub fn new(words: &WordList) -> Self {
        let items = words
            .iter()
            .map(|word| CompletionItem {
                label: word.to_owned(),
                ..CompletionItem::default()
            })
            .collect();
        Self { items }
    }
}

impl TypedHandler for CompletionHandler {
    type Params = Value;
    type Output = CompletionList;

    fn call(&self, params: Self::Params) -> Result<Self::Output, HandlerError> {
        match serde_json::from_value::<CompletionParams>(params) {
            Ok(request) => {
                let position = request.text_document_position;
                debug!(
                    target: HANDLER_TARGET,
                    uri = %position.text_document.uri.as_str(),
                    line = position.position.line,
                    character = position.position.character,
                    "completion requested"
                );
            }
            Err(error) => {
                debug!(target: HANDLER_TARGET, %error, "completion requested without a position");
            }
        }
        Ok(CompletionList {
            is_incomplete: false,
            items: self.items.clone(),
        })
    }
}
