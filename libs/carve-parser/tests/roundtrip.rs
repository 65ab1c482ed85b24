//! Lexer and parser round-trip properties over realistic documents.

use carve_parser::lexer::{Lexer, TokenKind};
use carve_parser::{parse, Statement};

const WHEEL: &str = r#"
// a spoked wheel
define spokes 8
define rim 1.5

difference {
    lathe {
        path {
            point rim 0.1
            point rim -0.1
            point rim - 0.2 -0.1
            point rim - 0.2 0.1
            point rim 0.1
        }
    }
    for i in 1 to spokes {
        rotate 0 2 / spokes 0
        cube {
            size 0.1 rim 0.1
            color #808080
        }
    }
}
"#;

#[test]
fn token_spans_partition_the_source() {
    let tokens = Lexer::new(WHEEL).tokenize().unwrap();
    let mut previous_end = 0;
    for token in &tokens {
        assert!(
            token.span.start.byte >= previous_end,
            "token {:?} overlaps its predecessor",
            token
        );
        assert!(token.span.end.byte >= token.span.start.byte);
        previous_end = token.span.end.byte;
    }
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn literal_tokens_match_their_spans() {
    let tokens = Lexer::new(WHEEL).tokenize().unwrap();
    for token in &tokens {
        match token.kind {
            TokenKind::Number | TokenKind::Identifier | TokenKind::HexColor => {
                let slice = &WHEEL[token.span.start.byte..token.span.end.byte];
                assert_eq!(slice, token.text);
            }
            _ => {}
        }
    }
}

#[test]
fn wheel_document_parses_clean() {
    let parsed = parse(WHEEL).unwrap();
    assert!(parsed.is_ok(), "errors: {:?}", parsed.errors);
    assert_eq!(parsed.program.statements.len(), 3);
    assert!(matches!(
        parsed.program.statements[2],
        Statement::Command { .. }
    ));
}

#[test]
fn statement_spans_nest_inside_the_source() {
    let parsed = parse(WHEEL).unwrap();
    for statement in &parsed.program.statements {
        use carve_parser::Spanned;
        let span = statement.span();
        assert!(span.end.byte <= WHEEL.len());
        assert!(span.start.byte < span.end.byte);
    }
}

#[test]
fn error_spans_point_into_the_source() {
    let source = "define x 1\ntranslate 1, 2\ncube";
    let parsed = parse(source).unwrap();
    assert!(!parsed.is_ok());
    let error = &parsed.errors[0];
    assert_eq!(&source[error.span.start.byte..error.span.end.byte], ",");
    // Recovery still parses the rest.
    assert!(parsed.program.statements.len() >= 2);
}
