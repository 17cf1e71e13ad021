use crate::analysis::token::Token;

/// One stage of an analyzer chain.
///
/// Filters run after tokenization on the tokens of a single full-text line
/// of a record. They may rewrite or drop tokens but keep the `position` and
/// `offset` the tokenizer assigned, so BM25 document lengths stay tied to
/// the original line.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    /// Name shown in analyzer debug output
    fn name(&self) -> &str;
}
