use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

// Function words that carry no meaning in a record description line.
// Compared after lower-casing, so the analyzer must fold case first.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for",
    "from", "has", "he", "in", "is", "it", "its", "of", "on",
    "that", "the", "to", "was", "will", "with",
];

/// Drops tokens found in a fixed word set.
///
/// Stop words would otherwise show up at the top of
/// `most_frequent_full_text_tokens` and inflate every record's length.
pub struct StopWordFilter {
    pub stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new<S: Into<String>>(stop_words: impl IntoIterator<Item = S>) -> Self {
        StopWordFilter {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn english() -> Self {
        StopWordFilter::new(ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Adds collection-specific noise words such as a record type name
    pub fn with_words<S: Into<String>>(mut self, words: impl IntoIterator<Item = S>) -> Self {
        self.stop_words.extend(words.into_iter().map(Into::into));
        self
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        tokens.retain(|token| !self.stop_words.contains(&token.text));
        tokens
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}
