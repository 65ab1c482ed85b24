//! # Carve Lexer
//!
//! Tokenizes Carve source code. Linebreaks are significant and collapse
//! per run; whitespace and `//` comments are skipped. Lexical errors
//! abort tokenization with a span and a hint.
//!
//! ## Example
//!
//! ```rust
//! use carve_parser::lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::new("cube { size 2 }").tokenize().unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! ```

mod cursor;
mod token;

pub use cursor::Cursor;
pub use token::{Token, TokenKind};

use crate::error::{ParseError, ParseErrorKind};
use crate::span::{Position, Span};

// =============================================================================
// LEXER
// =============================================================================

/// Carve lexer.
///
/// Converts source text into a stream of tokens ending with `Eof`.
pub struct Lexer<'a> {
    /// Character cursor.
    cursor: Cursor<'a>,
    /// Collected tokens.
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for source text.
    ///
    /// ## Parameters
    ///
    /// - `source`: Carve source code
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    ///
    /// ## Returns
    ///
    /// All tokens including a final `Eof`, or the first lexical error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        while !self.cursor.is_eof() {
            self.skip_blanks_and_comments();
            if self.cursor.is_eof() {
                break;
            }
            self.scan_token()?;
        }
        let eof = self.cursor.position();
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(eof, eof), ""));
        Ok(self.tokens)
    }

    /// Skip spaces, tabs, and comments. Newlines are tokens, not blanks.
    fn skip_blanks_and_comments(&mut self) {
        loop {
            self.cursor
                .advance_while(|c| c.is_whitespace() && c != '\n');
            if self.cursor.peek() == Some('/') && self.cursor.peek_next() == Some('/') {
                self.cursor.advance_while(|c| c != '\n');
                continue;
            }
            break;
        }
    }

    /// Scan a single token.
    fn scan_token(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.position();
        let c = match self.cursor.advance() {
            Some(c) => c,
            None => return Ok(()),
        };

        let kind = match c {
            '\n' => {
                // Collapse the whole run of blank lines into one token.
                loop {
                    self.skip_blanks_and_comments();
                    if self.cursor.peek() == Some('\n') {
                        self.cursor.advance();
                    } else {
                        break;
                    }
                }
                self.push(TokenKind::Linebreak, start, "\n");
                return Ok(());
            }
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Eq,
            '<' => match self.cursor.peek() {
                Some('=') => {
                    self.cursor.advance();
                    TokenKind::LtEq
                }
                Some('>') => {
                    self.cursor.advance();
                    TokenKind::LtGt
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '"' => return self.scan_string(start),
            '#' => return self.scan_color(start),
            '0'..='9' => return self.scan_number(start),
            '.' if matches!(self.cursor.peek(), Some('0'..='9')) => {
                return self.scan_number(start)
            }
            '.' => TokenKind::Dot,
            c if c.is_alphabetic() || c == '_' => return self.scan_identifier(start),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedCharacter { found: other },
                    Span::new(start, self.cursor.position()),
                ))
            }
        };

        let end = self.cursor.position();
        let text = self.cursor.slice(start, end).to_string();
        self.tokens.push(Token::new(kind, Span::new(start, end), text));
        Ok(())
    }

    /// Scan a string literal, decoding escapes.
    fn scan_string(&mut self, start: Position) -> Result<(), ParseError> {
        let mut decoded = String::new();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.position()),
                    ));
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    let escape_start = self.cursor.position();
                    match self.cursor.advance() {
                        Some('"') => decoded.push('"'),
                        Some('\\') => decoded.push('\\'),
                        Some('n') => decoded.push('\n'),
                        Some('t') => decoded.push('\t'),
                        other => {
                            return Err(ParseError::new(
                                ParseErrorKind::InvalidEscape {
                                    sequence: other.map(String::from).unwrap_or_default(),
                                },
                                Span::new(escape_start, self.cursor.position()),
                            ));
                        }
                    }
                }
                Some(c) => {
                    decoded.push(c);
                    self.cursor.advance();
                }
            }
        }
        self.push(TokenKind::String, start, decoded);
        Ok(())
    }

    /// Scan a `#RGB[A]` / `#RRGGBB[AA]` hex color literal.
    fn scan_color(&mut self, start: Position) -> Result<(), ParseError> {
        self.cursor.advance_while(|c| c.is_ascii_alphanumeric());
        let end = self.cursor.position();
        let text = self.cursor.slice(start, end).to_string();
        let digits = &text[1..];
        let valid_len = matches!(digits.len(), 3 | 4 | 6 | 8);
        if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidColor { text },
                Span::new(start, end),
            ));
        }
        self.tokens
            .push(Token::new(TokenKind::HexColor, Span::new(start, end), text));
        Ok(())
    }

    /// Scan a number literal.
    fn scan_number(&mut self, start: Position) -> Result<(), ParseError> {
        self.cursor
            .advance_while(|c| c.is_ascii_digit() || c == '.');
        let end = self.cursor.position();
        let text = self.cursor.slice(start, end).to_string();
        if text.parse::<f64>().is_err() || text.matches('.').count() > 1 {
            return Err(ParseError::new(
                ParseErrorKind::InvalidNumber { text },
                Span::new(start, end),
            ));
        }
        self.tokens
            .push(Token::new(TokenKind::Number, Span::new(start, end), text));
        Ok(())
    }

    /// Scan an identifier, keyword, or word operator.
    fn scan_identifier(&mut self, start: Position) -> Result<(), ParseError> {
        self.cursor
            .advance_while(|c| c.is_alphanumeric() || c == '_');
        let end = self.cursor.position();
        let text = self.cursor.slice(start, end).to_string();
        let kind = match text.as_str() {
            "define" => TokenKind::Define,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "import" => TokenKind::Import,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "to" => TokenKind::To,
            "step" => TokenKind::Step,
            _ => TokenKind::Identifier,
        };
        self.tokens.push(Token::new(kind, Span::new(start, end), text));
        Ok(())
    }

    fn push(&mut self, kind: TokenKind, start: Position, text: impl Into<String>) {
        let end = self.cursor.position();
        self.tokens.push(Token::new(kind, Span::new(start, end), text));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_block_call() {
        assert_eq!(
            kinds("cube { size 2 }"),
            vec![
                TokenKind::Identifier,
                TokenKind::LBrace,
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_linebreaks_collapse() {
        assert_eq!(
            kinds("a\n\n\nb"),
            vec![
                TokenKind::Identifier,
                TokenKind::Linebreak,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a // comment\nb"),
            vec![
                TokenKind::Identifier,
                TokenKind::Linebreak,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_word_operators() {
        assert_eq!(
            kinds("for i in 1 to 5 step 2"),
            vec![
                TokenKind::For,
                TokenKind::Identifier,
                TokenKind::In,
                TokenKind::Number,
                TokenKind::To,
                TokenKind::Number,
                TokenKind::Step,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("a <= b <> c >= d"),
            vec![
                TokenKind::Identifier,
                TokenKind::LtEq,
                TokenKind::Identifier,
                TokenKind::LtGt,
                TokenKind::Identifier,
                TokenKind::GtEq,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes_decode() {
        let tokens = Lexer::new("\"a\\n\\\"b\\\"\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\n\"b\"");
    }

    #[test]
    fn test_unterminated_string() {
        let error = Lexer::new("\"abc\ndef").tokenize().unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn test_invalid_escape() {
        let error = Lexer::new("\"a\\qb\"").tokenize().unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::InvalidEscape { .. }));
    }

    #[test]
    fn test_hex_colors() {
        let tokens = Lexer::new("#f00 #ff0000cc").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::HexColor);
        assert_eq!(tokens[0].text, "#f00");
        assert_eq!(tokens[1].text, "#ff0000cc");
    }

    #[test]
    fn test_invalid_color() {
        let error = Lexer::new("#12345").tokenize().unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::InvalidColor { .. }));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("1 2.5 .75").tokenize().unwrap();
        assert_eq!(tokens[0].text, "1");
        assert_eq!(tokens[1].text, "2.5");
        assert_eq!(tokens[2].text, ".75");
    }

    #[test]
    fn test_invalid_number() {
        let error = Lexer::new("1.2.3").tokenize().unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::InvalidNumber { .. }));
    }

    #[test]
    fn test_unexpected_character() {
        let error = Lexer::new("a @ b").tokenize().unwrap_err();
        assert_eq!(
            error.kind,
            ParseErrorKind::UnexpectedCharacter { found: '@' }
        );
    }

    #[test]
    fn test_spans_partition_source() {
        let source = "define x 1 + 2";
        let tokens = Lexer::new(source).tokenize().unwrap();
        // Token spans are ordered and non-overlapping.
        for pair in tokens.windows(2) {
            assert!(pair[0].span.end.byte <= pair[1].span.start.byte);
        }
        // Re-emitting literal token text reproduces the source modulo
        // whitespace.
        let rebuilt: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt.join(" "), source);
    }
}
