// tests/lexer_tests.rs

use jmespath_lang::ast::Token;
use jmespath_lang::lexer::{Lexer, Position};
use jmespath_lang::Value;
use pretty_assertions::assert_eq;
use serde_json::json;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|lexed| lexed.token)
        .collect()
}

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        (".", Token::Dot),
        ("*", Token::Star),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        ("(", Token::LParen),
        (")", Token::RParen),
        (",", Token::Comma),
        (":", Token::Colon),
        ("@", Token::At),
        ("&", Token::Ampersand),
        ("|", Token::Pipe),
        ("!", Token::Not),
        ("<", Token::Lt),
        (">", Token::Gt),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap().token;
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
    }
}

// ============================================================================
// Two Character Tokens
// ============================================================================

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
        ("||", Token::Or),
        ("&&", Token::And),
        ("[]", Token::Flatten),
        ("[?", Token::Filter),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "Failed for input: {}", input);
    }
}

#[test]
fn test_bracket_with_space_is_not_flatten() {
    assert_eq!(tokens("[ ]"), vec![Token::LBracket, Token::RBracket, Token::Eof]);
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn test_identifiers() {
    assert_eq!(
        tokens("foo _bar baz2"),
        vec![
            Token::Identifier("foo".into()),
            Token::Identifier("_bar".into()),
            Token::Identifier("baz2".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_quoted_identifier_escapes() {
    assert_eq!(
        tokens(r#""with space" "tab\there" "é""#),
        vec![
            Token::QuotedIdentifier("with space".into()),
            Token::QuotedIdentifier("tab\there".into()),
            Token::QuotedIdentifier("é".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_unclosed_quoted_identifier() {
    let err = Lexer::new(r#"foo."bar"#).tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 5));
    assert_eq!(err.found, "end of expression");
}

// ============================================================================
// Numbers and Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("[0] [-12]"),
        vec![
            Token::LBracket,
            Token::Number(0),
            Token::RBracket,
            Token::LBracket,
            Token::Number(-12),
            Token::RBracket,
            Token::Eof,
        ]
    );
}

#[test]
fn test_minus_without_digit() {
    let err = Lexer::new("[-]").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 3));
    assert_eq!(err.found, "']'");
}

#[test]
fn test_json_literals() {
    assert_eq!(
        tokens(r#"`true` `{"a": [1, 2.5]}` `"x"`"#),
        vec![
            Token::Literal(Value::Boolean(true)),
            Token::Literal(Value::from(json!({"a": [1, 2.5]}))),
            Token::Literal(Value::from("x")),
            Token::Eof,
        ]
    );
}

#[test]
fn test_literal_escaped_backtick() {
    assert_eq!(
        tokens(r#"`"a\`b"`"#),
        vec![Token::Literal(Value::from("a`b")), Token::Eof]
    );
}

#[test]
fn test_invalid_json_literal() {
    let err = Lexer::new("a == `{nope}`").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 6));
    assert!(err.message.starts_with("invalid JSON literal"));
}

#[test]
fn test_raw_strings() {
    assert_eq!(
        tokens(r"'plain' 'it\'s' 'back\\slash' 'keep\n'"),
        vec![
            Token::RawString("plain".into()),
            Token::RawString("it's".into()),
            Token::RawString("back\\slash".into()),
            Token::RawString("keep\\n".into()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Positions and Errors
// ============================================================================

#[test]
fn test_multiline_positions() {
    let lexed = Lexer::new("a |\n  b").tokenize().unwrap();
    let positions: Vec<Position> = lexed.iter().map(|l| l.position).collect();
    assert_eq!(
        positions,
        vec![
            Position::new(1, 1),
            Position::new(1, 3),
            Position::new(2, 3),
            Position::new(2, 4),
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let err = Lexer::new("foo#").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 4));
    assert_eq!(err.found, "'#'");
    assert_eq!(
        err.to_string(),
        "syntax error at line 1 column 4: unexpected character (found '#')"
    );
}
