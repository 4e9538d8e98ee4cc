use logos::Logos;

use crate::error::ScanError;
use crate::token::{RawToken, Token, TokenKind};

/// Scans `source` into a flat token sequence.
///
/// Whitespace (space, tab, CR) and `//` line comments are discarded; newlines
/// advance the line counter reported on every [`Token`] and in any
/// [`ScanError`]. Fails fast on the first unrecognized character or
/// unterminated string.
pub fn scan(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut lex = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lex.next() {
        let line = lex.extras.line;
        match result {
            Ok(raw) => {
                if raw.is_string() && lex.extras.unterminated_string {
                    return Err(ScanError::UnterminatedString { line });
                }
                let kind = TokenKind::from(&raw);
                tokens.push(Token::new(kind, lex.slice(), line));
            }
            Err(()) => return Err(ScanError::UnrecognizedToken { line }),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds("int booly"),
            vec![TokenKind::KwInt, TokenKind::Identifier]
        );
    }

    #[test]
    fn longest_match_wins_for_operators() {
        assert_eq!(
            kinds("a += 1"),
            vec![TokenKind::Identifier, TokenKind::PlusEq, TokenKind::Number]
        );
        assert_eq!(kinds("a+1"), vec![TokenKind::Identifier, TokenKind::Plus, TokenKind::Number]);
    }

    #[test]
    fn tracks_line_numbers_across_newlines_and_comments() {
        let tokens = scan("int a;\n// comment\nint b;").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 3, 3, 3]);
    }

    #[test]
    fn string_literal_keeps_surrounding_quotes() {
        let tokens = scan(r#"@native("m::f")"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].text, r#""m::f""#);
    }

    #[test]
    fn string_literal_allows_escaped_quote() {
        let tokens = scan(r#""a\"b""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
    }

    #[test]
    fn unterminated_string_at_eol_is_an_error() {
        let err = scan("\"abc\nint").unwrap_err();
        assert_eq!(err, ScanError::UnterminatedString { line: 1 });
    }

    #[test]
    fn unterminated_string_at_eof_is_an_error() {
        let err = scan("\"abc").unwrap_err();
        assert_eq!(err, ScanError::UnterminatedString { line: 1 });
    }

    #[test]
    fn unrecognized_character_is_an_error() {
        let err = scan("int a = 1 $ 2;").unwrap_err();
        assert_eq!(err, ScanError::UnrecognizedToken { line: 1 });
    }
}
