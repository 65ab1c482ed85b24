//! # Carve Parser
//!
//! Lexer, recursive-descent parser, and AST for the Carve
//! scene-description language.
//!
//! ## Architecture
//!
//! ```text
//! Source Text -> Lexer -> Tokens -> Parser -> AST
//! ```
//!
//! This crate is the first layer of the Carve pipeline:
//!
//! ```text
//! carve-parser -> carve-eval -> carve-mesh
//! ```
//!
//! ## Example
//!
//! ```rust
//! let parsed = carve_parser::parse("cube { size 2 }").unwrap();
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.program.statements.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export public API
pub use ast::{Expression, ExpressionKind, Identifier, InfixOp, PrefixOp, Program, Statement};
pub use error::{ParseError, ParseErrorKind};
pub use parser::{Parsed, Parser};
pub use span::{Position, Span, Spanned};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Parse Carve source code.
///
/// Lexical errors abort immediately; syntactic errors are recovered and
/// collected on the returned [`Parsed`], so check [`Parsed::is_ok`].
///
/// ## Parameters
///
/// - `source`: Carve source text
///
/// ## Example
///
/// ```rust
/// let parsed = carve_parser::parse("define radius 1.5").unwrap();
/// assert!(parsed.is_ok());
///
/// let error = carve_parser::parse("\"unterminated").unwrap_err();
/// assert!(!error.hint().is_empty());
/// ```
pub fn parse(source: &str) -> Result<Parsed, ParseError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse())
}

// =============================================================================
// TESTS
// =============================================================================
