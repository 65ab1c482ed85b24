//! # Statement Parsing
//!
//! `define`, `for`, `if`/`else`, `import`, and command/block invocations.

use crate::ast::{Expression, ExpressionKind, Identifier, Statement};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    /// Parse one statement.
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            TokenKind::Define => self.parse_define(),
            TokenKind::For => self.parse_for(),
            TokenKind::If => self.parse_if(),
            TokenKind::Import => self.parse_import(),
            TokenKind::Identifier => self.parse_command(),
            TokenKind::Comma => Err(ParseError::new(
                ParseErrorKind::UnexpectedComma,
                self.peek().span,
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::InvalidStatement {
                    found: self.peek().text.clone(),
                },
                self.peek().span,
            )),
        }
    }

    /// `define name value`
    fn parse_define(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Define)?;
        let name = self.parse_identifier()?;
        if self.peek().is_terminator() {
            return Err(ParseError::new(
                ParseErrorKind::MissingArgument {
                    name: name.name.clone(),
                },
                keyword.span.union(&name.span),
            ));
        }
        let value = self.parse_arguments(&name.name)?;
        let span = keyword.span.union(&value.span());
        Ok(Statement::Define { name, value, span })
    }

    /// `for [index in] range { body }`
    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::For)?;
        let index = if self.check(TokenKind::Identifier)
            && self.peek_next_kind() == TokenKind::In
        {
            let index = self.parse_identifier()?;
            self.expect(TokenKind::In)?;
            Some(index)
        } else {
            None
        };
        let range = self.parse_expression()?;
        let body = self.parse_body()?;
        let span = keyword.span.union(&self.previous_span());
        Ok(Statement::For {
            index,
            range,
            body,
            span,
        })
    }

    /// `if condition { then } [else { otherwise } | else if ...]`
    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_body = self.parse_body()?;
        let else_body = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // `else if` chains as a nested statement.
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_body()?)
            }
        } else {
            None
        };
        let span = keyword.span.union(&self.previous_span());
        Ok(Statement::If {
            condition,
            then_body,
            else_body,
            span,
        })
    }

    /// `import "path"`
    fn parse_import(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Import)?;
        if self.peek().is_terminator() {
            return Err(ParseError::new(
                ParseErrorKind::MissingArgument {
                    name: "import".to_string(),
                },
                keyword.span,
            ));
        }
        let path = self.parse_expression()?;
        let span = keyword.span.union(&path.span());
        Ok(Statement::Import { path, span })
    }

    /// `name [arguments] [{ children }]`
    fn parse_command(&mut self) -> Result<Statement, ParseError> {
        let name = self.parse_identifier()?;
        let arg = if self.peek_kind().starts_operand() {
            Some(self.parse_arguments(&name.name)?)
        } else {
            None
        };
        let children = if self.check(TokenKind::LBrace) {
            Some(self.parse_body()?)
        } else {
            None
        };
        let span = name.span.union(&self.previous_span());
        Ok(Statement::Command {
            name,
            arg,
            children,
            span,
        })
    }

    /// Space-separated argument tuple, up to the end of the line or an
    /// opening brace.
    fn parse_arguments(&mut self, name: &str) -> Result<Expression, ParseError> {
        let mut items = Vec::new();
        while self.peek_kind().starts_operand() {
            items.push(self.parse_tuple_element()?);
            if self.check(TokenKind::Comma) {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedComma,
                    self.peek().span,
                ));
            }
        }
        match items.len() {
            0 => Err(ParseError::new(
                ParseErrorKind::MissingArgument {
                    name: name.to_string(),
                },
                self.peek().span,
            )),
            1 => Ok(items.into_iter().next().expect("one element")),
            _ => {
                let span = items[0].span.union(&items[items.len() - 1].span);
                Ok(Expression::new(ExpressionKind::Tuple(items), span))
            }
        }
    }

    /// A bare identifier.
    fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(Identifier {
            name: token.text,
            span: token.span,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parsed;

    fn parse(source: &str) -> Parsed {
        Parser::new(Lexer::new(source).tokenize().unwrap()).parse()
    }

    fn single(source: &str) -> Statement {
        let parsed = parse(source);
        assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
        assert_eq!(parsed.program.statements.len(), 1);
        parsed.program.statements.into_iter().next().unwrap()
    }

    #[test]
    fn test_define() {
        match single("define radius 1.5") {
            Statement::Define { name, value, .. } => {
                assert_eq!(name.name, "radius");
                assert_eq!(value.kind, ExpressionKind::Number(1.5));
            }
            other => panic!("expected define, got {other:?}"),
        }
    }

    #[test]
    fn test_define_tuple() {
        match single("define origin 1 2 3") {
            Statement::Define { value, .. } => match value.kind {
                ExpressionKind::Tuple(items) => assert_eq!(items.len(), 3),
                other => panic!("expected tuple, got {other:?}"),
            },
            other => panic!("expected define, got {other:?}"),
        }
    }

    #[test]
    fn test_define_requires_value() {
        let parsed = parse("define x");
        assert!(!parsed.is_ok());
        assert!(matches!(
            parsed.errors[0].kind,
            ParseErrorKind::MissingArgument { .. }
        ));
    }

    #[test]
    fn test_for_with_index() {
        match single("for i in 0 to 5 step 2 {\nprint i\n}") {
            Statement::For {
                index, range, body, ..
            } => {
                assert_eq!(index.unwrap().name, "i");
                assert!(matches!(range.kind, ExpressionKind::Range { .. }));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_for_without_index() {
        match single("for 1 to 3 { cube }") {
            Statement::For { index, .. } => assert!(index.is_none()),
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_if_else_chain() {
        match single("if x > 1 {\ncube\n} else if x < 0 {\nsphere\n} else {\ncylinder\n}") {
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                assert_eq!(then_body.len(), 1);
                let else_body = else_body.unwrap();
                assert_eq!(else_body.len(), 1);
                assert!(matches!(else_body[0], Statement::If { .. }));
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_import() {
        match single("import \"shapes.carve\"") {
            Statement::Import { path, .. } => {
                assert_eq!(path.kind, ExpressionKind::String("shapes.carve".into()));
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_command() {
        match single("sphere") {
            Statement::Command {
                name,
                arg,
                children,
                ..
            } => {
                assert_eq!(name.name, "sphere");
                assert!(arg.is_none());
                assert!(children.is_none());
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_command_with_args() {
        match single("translate 1 0 0") {
            Statement::Command { arg, .. } => {
                assert!(matches!(
                    arg.unwrap().kind,
                    ExpressionKind::Tuple(ref items) if items.len() == 3
                ));
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_block_call_with_children() {
        match single("cube {\nsize 2\ncolor #f00\n}") {
            Statement::Command { children, .. } => {
                assert_eq!(children.unwrap().len(), 2);
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_block_on_same_line() {
        match single("difference { cube\nsphere }") {
            Statement::Command { children, .. } => {
                assert_eq!(children.unwrap().len(), 2);
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_number_args_stay_separate() {
        // A spaced minus directly before a number starts a new tuple
        // element rather than subtracting.
        match single("translate 1 -1 0") {
            Statement::Command { arg, .. } => match arg.unwrap().kind {
                ExpressionKind::Tuple(items) => assert_eq!(items.len(), 3),
                other => panic!("expected tuple, got {other:?}"),
            },
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_comma_rejected_with_hint() {
        let parsed = parse("translate 1, 2, 3");
        assert!(!parsed.is_ok());
        assert!(matches!(
            parsed.errors[0].kind,
            ParseErrorKind::UnexpectedComma
        ));
    }
}
