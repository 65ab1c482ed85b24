//! # Abstract Syntax Tree
//!
//! AST types for Carve programs: linebreak-terminated statements whose
//! arguments are space-separated expression tuples.
//!
//! Every node carries its source span so the evaluator can attach
//! locations to runtime errors and geometry nodes.

use serde::{Deserialize, Serialize};

use crate::span::{Span, Spanned};

// =============================================================================
// PROGRAM
// =============================================================================

/// A parsed program: top-level statements plus any recovered errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements.
    pub statements: Vec<Statement>,
}

// =============================================================================
// STATEMENTS
// =============================================================================

/// An identifier with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Symbol name.
    pub name: String,
    /// Source span.
    pub span: Span,
}

/// A Carve statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `define name expression`
    Define {
        /// Defined symbol.
        name: Identifier,
        /// Bound value.
        value: Expression,
        /// Whole-statement span.
        span: Span,
    },

    /// `for [index in] range { body }`
    For {
        /// Optional loop variable.
        index: Option<Identifier>,
        /// Range expression (`from to to [step s]`).
        range: Expression,
        /// Loop body.
        body: Vec<Statement>,
        /// Whole-statement span.
        span: Span,
    },

    /// `if condition { then } [else { otherwise }]`
    If {
        /// Branch condition.
        condition: Expression,
        /// Then branch.
        then_body: Vec<Statement>,
        /// Else branch; a chained `else if` nests another `If` here.
        else_body: Option<Vec<Statement>>,
        /// Whole-statement span.
        span: Span,
    },

    /// `import "path"`
    Import {
        /// Path expression.
        path: Expression,
        /// Whole-statement span.
        span: Span,
    },

    /// A command or block invocation: `name [arguments] [{ children }]`.
    ///
    /// `translate 1 0 0` is a command; `cube { size 2 }` is a block call;
    /// bare `sphere` is a block call with no children.
    Command {
        /// Invoked symbol.
        name: Identifier,
        /// Space-separated argument tuple, absent for bare calls.
        arg: Option<Expression>,
        /// Nested statements for block calls.
        children: Option<Vec<Statement>>,
        /// Whole-statement span.
        span: Span,
    },
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Define { span, .. }
            | Statement::For { span, .. }
            | Statement::If { span, .. }
            | Statement::Import { span, .. }
            | Statement::Command { span, .. } => *span,
        }
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    /// Numeric negation.
    Minus,
    /// Boolean negation.
    Not,
}

/// Infix operators, loosest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfixOp {
    /// `or`
    Or,
    /// `and`
    And,
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl InfixOp {
    /// Binding power; higher binds tighter.
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessOrEqual
            | Self::Greater
            | Self::GreaterOrEqual => 3,
            Self::Add | Self::Subtract => 4,
            Self::Multiply | Self::Divide => 5,
        }
    }
}

/// An expression with its source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Expression payload.
    pub kind: ExpressionKind,
    /// Source span.
    pub span: Span,
}

impl Expression {
    /// Create an expression.
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl Spanned for Expression {
    fn span(&self) -> Span {
        self.span
    }
}

/// Expression payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Number literal.
    Number(f64),
    /// String literal (already unescaped).
    String(String),
    /// Hex color literal as linear RGBA components.
    Color([f64; 4]),
    /// Symbol reference.
    Identifier(String),
    /// Member access like `position.x`.
    Member {
        /// Base expression.
        base: Box<Expression>,
        /// Member name.
        member: String,
    },
    /// Function call like `atan2(y x)`.
    Call {
        /// Function name.
        name: String,
        /// Space-separated arguments.
        args: Vec<Expression>,
    },
    /// Space-separated tuple like `1 0 0`.
    Tuple(Vec<Expression>),
    /// Prefix operation.
    Prefix {
        /// Operator.
        op: PrefixOp,
        /// Operand.
        operand: Box<Expression>,
    },
    /// Infix operation.
    Infix {
        /// Operator.
        op: InfixOp,
        /// Left operand.
        lhs: Box<Expression>,
        /// Right operand.
        rhs: Box<Expression>,
    },
    /// Numeric range `from to to [step s]`.
    Range {
        /// Inclusive start.
        from: Box<Expression>,
        /// Inclusive end.
        to: Box<Expression>,
        /// Optional stride.
        step: Option<Box<Expression>>,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(InfixOp::Or.precedence() < InfixOp::And.precedence());
        assert!(InfixOp::And.precedence() < InfixOp::Equal.precedence());
        assert!(InfixOp::Less.precedence() < InfixOp::Add.precedence());
        assert!(InfixOp::Add.precedence() < InfixOp::Multiply.precedence());
    }

    #[test]
    fn test_statement_spans() {
        let stmt = Statement::Import {
            path: Expression::new(ExpressionKind::String("lib.carve".into()), Span::zero()),
            span: Span::zero(),
        };
        assert_eq!(stmt.span(), Span::zero());
    }
}
