//! Rule string tokenizer

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RuleEngineError};

/// Token alternatives in priority order. Two-char symbols before one-char
/// ones; signed and fractional numbers before plain word runs.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A(?:=>|<=|>=|&&|\|\||'[^']*'|-\d+(?:\.\d+)?|\d+\.\d+|[()=><!]|\w+)")
        .expect("token pattern is a valid regex")
});

/// Split a rule string into its tokens
///
/// Whitespace between tokens is discarded. Any character that starts none of
/// the token alternatives is a `LexError` carrying its byte offset.
pub fn tokenize(text: &str) -> Result<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();

        let Some(character) = trimmed.chars().next() else {
            break;
        };

        match TOKEN_PATTERN.find(trimmed) {
            Some(m) => {
                tokens.push(&text[offset..offset + m.end()]);
                offset += m.end();
            }
            None => return Err(RuleEngineError::LexError { offset, character }),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_rule() {
        let tokens = tokenize("age > 18 AND status = 'active'").unwrap();
        assert_eq!(tokens, vec!["age", ">", "18", "AND", "status", "=", "'active'"]);
    }

    #[test]
    fn test_tokenize_without_spaces() {
        let tokens = tokenize("(a>1)OR(b<2)").unwrap();
        assert_eq!(tokens, vec!["(", "a", ">", "1", ")", "OR", "(", "b", "<", "2", ")"]);
    }

    #[test]
    fn test_two_char_symbols_win() {
        let tokens = tokenize("a >= 1 && b <= 2 || c => 3").unwrap();
        assert_eq!(
            tokens,
            vec!["a", ">=", "1", "&&", "b", "<=", "2", "||", "c", "=>", "3"]
        );
    }

    #[test]
    fn test_numeric_literals() {
        let tokens = tokenize("x > 2.5 AND y < -3 AND z = -0.25").unwrap();
        assert_eq!(
            tokens,
            vec!["x", ">", "2.5", "AND", "y", "<", "-3", "AND", "z", "=", "-0.25"]
        );
    }

    #[test]
    fn test_quoted_literal_keeps_spaces() {
        let tokens = tokenize("city = 'new york'").unwrap();
        assert_eq!(tokens, vec!["city", "=", "'new york'"]);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t\n ").unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_character() {
        assert_eq!(
            tokenize("age > 18 $ x").unwrap_err(),
            RuleEngineError::LexError {
                offset: 9,
                character: '$'
            }
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            tokenize("name = 'bob").unwrap_err(),
            RuleEngineError::LexError {
                offset: 7,
                character: '\''
            }
        );
    }
}
