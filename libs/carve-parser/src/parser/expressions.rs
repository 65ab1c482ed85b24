//! # Expression Parsing
//!
//! Precedence-climbing expression parser. Binding, loosest first:
//! range (`to`/`step`), `or`, `and`, comparison, additive,
//! multiplicative, prefix, postfix (member access, calls).
//!
//! ## The spaced-minus rule
//!
//! Argument tuples are space-separated, which makes `translate 1 -1 0`
//! ambiguous: is `-` a subtraction or the sign of the second element?
//! Inside a tuple, a minus with whitespace before it but none after it
//! starts a new element; everywhere else it is the usual infix operator.

use crate::ast::{Expression, ExpressionKind, InfixOp, PrefixOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

use super::Parser;

impl Parser {
    /// Parse a full expression (no tuple rule), e.g. a condition or range.
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_range(false)
    }

    /// Parse one element of a space-separated tuple.
    pub(crate) fn parse_tuple_element(&mut self) -> Result<Expression, ParseError> {
        self.parse_range(true)
    }

    /// Ranges bind loosest: `1 + 2 to 10 step 2` is `(3) to (10) step (2)`.
    fn parse_range(&mut self, in_tuple: bool) -> Result<Expression, ParseError> {
        let from = self.parse_binary(1, in_tuple)?;
        if !self.eat(TokenKind::To) {
            return Ok(from);
        }
        let to = self.parse_binary(1, in_tuple)?;
        let step = if self.eat(TokenKind::Step) {
            Some(Box::new(self.parse_binary(1, in_tuple)?))
        } else {
            None
        };
        let span = from.span.union(&self.previous_span());
        Ok(Expression::new(
            ExpressionKind::Range {
                from: Box::new(from),
                to: Box::new(to),
                step,
            },
            span,
        ))
    }

    /// Precedence climbing over infix operators.
    fn parse_binary(&mut self, min_prec: u8, in_tuple: bool) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_unary(in_tuple)?;
        loop {
            let op = match infix_op(self.peek_kind()) {
                Some(op) => op,
                None => break,
            };
            if op.precedence() < min_prec {
                break;
            }
            if op == InfixOp::Subtract && in_tuple && self.minus_starts_new_element() {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(op.precedence() + 1, in_tuple)?;
            let span = lhs.span.union(&rhs.span);
            lhs = Expression::new(
                ExpressionKind::Infix {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    /// Prefix operators.
    fn parse_unary(&mut self, in_tuple: bool) -> Result<Expression, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(PrefixOp::Minus),
            TokenKind::Not => Some(PrefixOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance();
            let operand = self.parse_unary(in_tuple)?;
            let span = token.span.union(&operand.span);
            return Ok(Expression::new(
                ExpressionKind::Prefix {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_postfix(in_tuple)
    }

    /// Member access chains.
    fn parse_postfix(&mut self, in_tuple: bool) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary(in_tuple)?;
        while self.eat(TokenKind::Dot) {
            let member = self.expect(TokenKind::Identifier)?;
            let span = expr.span.union(&member.span);
            expr = Expression::new(
                ExpressionKind::Member {
                    base: Box::new(expr),
                    member: member.text,
                },
                span,
            );
        }
        Ok(expr)
    }

    /// Literals, identifiers, calls, and parenthesized tuples.
    fn parse_primary(&mut self, _in_tuple: bool) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            TokenKind::Number => {
                let token = self.advance();
                let value: f64 = token.text.parse().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidNumber {
                            text: token.text.clone(),
                        },
                        token.span,
                    )
                })?;
                Ok(Expression::new(ExpressionKind::Number(value), token.span))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Expression::new(
                    ExpressionKind::String(token.text),
                    token.span,
                ))
            }
            TokenKind::HexColor => {
                let token = self.advance();
                let rgba = hex_rgba(&token.text).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::InvalidColor {
                            text: token.text.clone(),
                        },
                        token.span,
                    )
                })?;
                Ok(Expression::new(ExpressionKind::Color(rgba), token.span))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                // An identifier applied to parentheses is a call, whether
                // or not whitespace separates them: `sin (x)` is `sin(x)`.
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenKind::RParen) && self.peek_kind().starts_operand() {
                        args.push(self.parse_tuple_element()?);
                    }
                    let close = self.expect(TokenKind::RParen)?;
                    let span = token.span.union(&close.span);
                    return Ok(Expression::new(
                        ExpressionKind::Call {
                            name: token.text,
                            args,
                        },
                        span,
                    ));
                }
                Ok(Expression::new(
                    ExpressionKind::Identifier(token.text),
                    token.span,
                ))
            }
            TokenKind::LParen => {
                let open = self.advance();
                let mut items = Vec::new();
                while !self.check(TokenKind::RParen) && self.peek_kind().starts_operand() {
                    items.push(self.parse_tuple_element()?);
                }
                let close = self.expect(TokenKind::RParen)?;
                let span = open.span.union(&close.span);
                match items.len() {
                    0 => Err(self.unexpected("an expression")),
                    1 => {
                        let mut expr = items.into_iter().next().expect("one element");
                        expr.span = span;
                        Ok(expr)
                    }
                    _ => Ok(Expression::new(ExpressionKind::Tuple(items), span)),
                }
            }
            TokenKind::Comma => Err(ParseError::new(
                ParseErrorKind::UnexpectedComma,
                self.peek().span,
            )),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// True when the minus at the current token should start a new tuple
    /// element: whitespace before it, none after it, and an operand
    /// follows.
    fn minus_starts_new_element(&self) -> bool {
        let minus = self.peek();
        let before = self
            .tokens_around()
            .0
            .map_or(false, |prev| prev.span.end.byte < minus.span.start.byte);
        let after = self
            .tokens_around()
            .1
            .map_or(false, |next| {
                minus.span.end.byte == next.span.start.byte && next.kind.starts_operand()
            });
        before && after
    }

    /// The tokens immediately before and after the current one.
    fn tokens_around(&self) -> (Option<&crate::lexer::Token>, Option<&crate::lexer::Token>) {
        let prev = self.current_index().checked_sub(1).and_then(|i| self.token_at(i));
        let next = self.token_at(self.current_index() + 1);
        (prev, next)
    }
}

/// Converts a hex color literal to RGBA components in [0, 1].
fn hex_rgba(text: &str) -> Option<[f64; 4]> {
    let digits: Vec<u8> = text
        .strip_prefix('#')?
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    let (r, g, b, a) = match digits.len() {
        3 => (digits[0] * 17, digits[1] * 17, digits[2] * 17, 255),
        4 => (digits[0] * 17, digits[1] * 17, digits[2] * 17, digits[3] * 17),
        6 => (
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            255,
        ),
        8 => (
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            digits[6] * 16 + digits[7],
        ),
        _ => return None,
    };
    Some([
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
        a as f64 / 255.0,
    ])
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    match kind {
        TokenKind::Or => Some(InfixOp::Or),
        TokenKind::And => Some(InfixOp::And),
        TokenKind::Eq => Some(InfixOp::Equal),
        TokenKind::LtGt => Some(InfixOp::NotEqual),
        TokenKind::Lt => Some(InfixOp::Less),
        TokenKind::LtEq => Some(InfixOp::LessOrEqual),
        TokenKind::Gt => Some(InfixOp::Greater),
        TokenKind::GtEq => Some(InfixOp::GreaterOrEqual),
        TokenKind::Plus => Some(InfixOp::Add),
        TokenKind::Minus => Some(InfixOp::Subtract),
        TokenKind::Star => Some(InfixOp::Multiply),
        TokenKind::Slash => Some(InfixOp::Divide),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::lexer::Lexer;

    fn expr(source: &str) -> Expression {
        let parsed = Parser::new(
            Lexer::new(&format!("define test {source}"))
                .tokenize()
                .unwrap(),
        )
        .parse();
        assert!(parsed.is_ok(), "parse errors: {:?}", parsed.errors);
        match parsed.program.statements.into_iter().next().unwrap() {
            Statement::Define { value, .. } => value,
            other => panic!("expected define, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_arithmetic() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match expr("1 + 2 * 3").kind {
            ExpressionKind::Infix { op, rhs, .. } => {
                assert_eq!(op, InfixOp::Add);
                assert!(matches!(
                    rhs.kind,
                    ExpressionKind::Infix {
                        op: InfixOp::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("expected infix, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_logic_loosest() {
        // a < 1 or b < 2 parses as (a < 1) or (b < 2)
        match expr("a < 1 or b < 2").kind {
            ExpressionKind::Infix { op, .. } => assert_eq!(op, InfixOp::Or),
            other => panic!("expected infix, got {other:?}"),
        }
    }

    #[test]
    fn test_range_binds_loosest() {
        match expr("1 + 2 to 10 step 2").kind {
            ExpressionKind::Range { from, step, .. } => {
                assert!(matches!(from.kind, ExpressionKind::Infix { .. }));
                assert!(step.is_some());
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_operators() {
        assert!(matches!(
            expr("-x").kind,
            ExpressionKind::Prefix {
                op: PrefixOp::Minus,
                ..
            }
        ));
        assert!(matches!(
            expr("not a and b").kind,
            // not binds tighter: (not a) and b
            ExpressionKind::Infix {
                op: InfixOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_member_access() {
        match expr("position.x").kind {
            ExpressionKind::Member { base, member } => {
                assert_eq!(member, "x");
                assert!(matches!(base.kind, ExpressionKind::Identifier(_)));
            }
            other => panic!("expected member, got {other:?}"),
        }
    }

    #[test]
    fn test_call_with_space() {
        // `sin (x)` is the call sin(x), not a juxtaposition.
        match expr("sin (x)").kind {
            ExpressionKind::Call { name, args } => {
                assert_eq!(name, "sin");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_call_multiple_args() {
        match expr("atan2(y x)").kind {
            ExpressionKind::Call { args, .. } => assert_eq!(args.len(), 2),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_tuple() {
        match expr("(1 2 3)").kind {
            ExpressionKind::Tuple(items) => assert_eq!(items.len(), 3),
            other => panic!("expected tuple, got {other:?}"),
        }
    }

    #[test]
    fn test_color_literal() {
        match expr("#f00").kind {
            ExpressionKind::Color(rgba) => {
                assert!((rgba[0] - 1.0).abs() < 1e-12);
                assert!((rgba[1]).abs() < 1e-12);
                assert!((rgba[3] - 1.0).abs() < 1e-12);
            }
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn test_comparison() {
        match expr("1 + 1 = 2").kind {
            ExpressionKind::Infix { op, .. } => assert_eq!(op, InfixOp::Equal),
            other => panic!("expected infix, got {other:?}"),
        }
        match expr("a <> b").kind {
            ExpressionKind::Infix { op, .. } => assert_eq!(op, InfixOp::NotEqual),
            other => panic!("expected infix, got {other:?}"),
        }
    }
}
