use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Case-folds tokens so `"EUR Swap 5Y"` and `"eur swap 5y"` index alike.
/// Tokens that are already lower case are passed through untouched.
pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in tokens.iter_mut().filter(|t| t.text.chars().any(char::is_uppercase)) {
            token.text = token.text.to_lowercase();
        }
        tokens
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}
