//! Quote-aware splitting of one log line into positional tokens.
//!
//! Tokens are separated by runs of ASCII whitespace. A double quote at the
//! start of a token opens a quoted token that runs to the next double quote;
//! whitespace inside it is kept verbatim and the quotes themselves are dropped.
//! The closing quote always ends the token, so `"a b"c` yields `a b` and `c`.
//! A quote anywhere else is an ordinary character.

use serde::{Deserialize, Serialize};

use super::model::{ParseError, FIELD_COUNT};

/// What to do with a quoted token that is still open at end of line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Fail the line with [`ParseError::UnterminatedQuote`].
    #[default]
    Reject,
    /// Treat everything after the opening quote as the token's content.
    TakeRest,
}

impl std::str::FromStr for QuotePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(QuotePolicy::Reject),
            "take_rest" => Ok(QuotePolicy::TakeRest),
            other => Err(format!("unknown quote policy: {}", other)),
        }
    }
}

/// Split `line` into tokens borrowed from it.
pub fn tokenize(line: &str, policy: QuotePolicy) -> Result<Vec<&str>, ParseError> {
    let mut tokens = Vec::with_capacity(FIELD_COUNT);
    let mut chars = line.char_indices();

    while let Some((start, c)) = chars.next() {
        if c.is_ascii_whitespace() {
            continue;
        }

        if c == '"' {
            let content_start = start + 1;
            let close = chars.by_ref().find(|&(_, c)| c == '"').map(|(i, _)| i);
            match (close, policy) {
                (Some(end), _) => tokens.push(&line[content_start..end]),
                (None, QuotePolicy::TakeRest) => {
                    tokens.push(&line[content_start..]);
                    break;
                }
                (None, QuotePolicy::Reject) => {
                    return Err(ParseError::UnterminatedQuote { offset: start });
                }
            }
        } else {
            let end = chars
                .by_ref()
                .find(|&(_, c)| c.is_ascii_whitespace())
                .map_or(line.len(), |(i, _)| i);
            tokens.push(&line[start..end]);
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Vec<&str> {
        tokenize(line, QuotePolicy::Reject).unwrap()
    }

    #[test]
    fn test_plain_tokens() {
        assert_eq!(split("a bb ccc"), vec!["a", "bb", "ccc"]);
    }

    #[test]
    fn test_empty_line() {
        assert!(split("").is_empty());
        assert!(split("   \t ").is_empty());
    }

    #[test]
    fn test_runs_of_whitespace_collapse() {
        assert_eq!(split("  a \t b  "), vec!["a", "b"]);
    }

    #[test]
    fn test_quoted_token_keeps_inner_spaces() {
        let tokens = split(r#"200 "GET http://www.example.com:80/ HTTP/1.1" -"#);
        assert_eq!(tokens, vec!["200", "GET http://www.example.com:80/ HTTP/1.1", "-"]);
    }

    #[test]
    fn test_quoted_token_preserves_extra_whitespace_exactly() {
        let tokens = split("\"  two  spaces\tand tab \"");
        assert_eq!(tokens, vec!["  two  spaces\tand tab "]);
    }

    #[test]
    fn test_quoted_placeholder_and_empty() {
        assert_eq!(split(r#""-" """#), vec!["-", ""]);
    }

    #[test]
    fn test_closing_quote_ends_token() {
        assert_eq!(split(r#""a b"c d"#), vec!["a b", "c", "d"]);
    }

    #[test]
    fn test_quote_inside_bare_token_is_literal() {
        assert_eq!(split(r#"ab"c d"#), vec![r#"ab"c"#, "d"]);
    }

    #[test]
    fn test_unterminated_quote_rejected() {
        let err = tokenize(r#"a "b c"#, QuotePolicy::Reject).unwrap_err();
        assert_eq!(err, ParseError::UnterminatedQuote { offset: 2 });
    }

    #[test]
    fn test_unterminated_quote_takes_rest() {
        let tokens = tokenize(r#"a "b c  "#, QuotePolicy::TakeRest).unwrap();
        assert_eq!(tokens, vec!["a", "b c  "]);
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(split("\"Mozilla/5.0 (ü)\" é"), vec!["Mozilla/5.0 (ü)", "é"]);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("reject".parse::<QuotePolicy>(), Ok(QuotePolicy::Reject));
        assert_eq!("take_rest".parse::<QuotePolicy>(), Ok(QuotePolicy::TakeRest));
        assert!("lenient".parse::<QuotePolicy>().is_err());
    }
}
