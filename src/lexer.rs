use std::fmt;

use thiserror::Error;

use crate::{ast::Token, value::Value};

/// A 1-based line/column location in an expression's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// A malformed expression.
///
/// Raised by both the lexer and the parser; parsing never returns a partial
/// tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {position}: {message} (found {found})")]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Description of the offending token or character
    pub found: String,
    /// Where the offending token starts
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, found: impl Into<String>, position: Position) -> Self {
        SyntaxError {
            message: message.into(),
            found: found.into(),
            position,
        }
    }
}

/// A token together with where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub token: Token,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, ending with [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Lexed>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let lexed = self.next_token()?;
            let done = lexed.token == Token::Eof;
            tokens.push(lexed);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        match self.current_char() {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => return,
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn found_here(&self) -> String {
        match self.current_char() {
            Some(ch) => format!("'{ch}'"),
            None => "end of expression".to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.found_here(), self.here())
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Reads `"..."` and decodes it with JSON string rules.
    fn read_quoted_identifier(&mut self, start: Position) -> Result<String, SyntaxError> {
        let mut raw = String::from('"');
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    raw.push('"');
                    self.advance();
                    return serde_json::from_str::<String>(&raw).map_err(|e| {
                        SyntaxError::new(format!("invalid quoted identifier: {e}"), raw.clone(), start)
                    });
                }
                '\\' => {
                    raw.push('\\');
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        raw.push(escaped);
                        self.advance();
                    }
                }
                _ => {
                    raw.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::new("unclosed quoted identifier", "end of expression", start))
    }

    /// Reads `'...'`; only `\'` and `\\` are escapes.
    fn read_raw_string(&mut self, start: Position) -> Result<String, SyntaxError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('\'') => {
                            result.push('\'');
                            self.advance();
                        }
                        Some('\\') => {
                            result.push('\\');
                            self.advance();
                        }
                        _ => result.push('\\'),
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::new("unclosed raw string", "end of expression", start))
    }

    /// Reads `` `...` `` and parses the contents as JSON.
    fn read_literal(&mut self, start: Position) -> Result<Value, SyntaxError> {
        let mut json = String::new();
        self.advance(); // opening backtick

        while let Some(ch) = self.current_char() {
            match ch {
                '`' => {
                    self.advance();
                    let parsed: serde_json::Value = serde_json::from_str(json.trim()).map_err(|e| {
                        SyntaxError::new(format!("invalid JSON literal: {e}"), format!("`{json}`"), start)
                    })?;
                    return Ok(Value::from(parsed));
                }
                '\\' if self.peek_char(1) == Some('`') => {
                    json.push('`');
                    self.advance();
                    self.advance();
                }
                _ => {
                    json.push(ch);
                    self.advance();
                }
            }
        }

        Err(SyntaxError::new("unclosed JSON literal", "end of expression", start))
    }

    fn read_number(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let mut number = String::new();

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
            if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("'-' must be followed by a digit"));
            }
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        number
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| SyntaxError::new("integer out of range", number.clone(), start))
    }

    /// Consumes one character and returns `token`.
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consumes one or two characters: `double` if the next one is `next`.
    fn either_or(&mut self, next: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    pub fn next_token(&mut self) -> Result<Lexed, SyntaxError> {
        self.skip_whitespace();
        let start = self.here();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('.') => self.single(Token::Dot),
            Some('*') => self.single(Token::Star),
            Some(']') => self.single(Token::RBracket),
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some(',') => self.single(Token::Comma),
            Some(':') => self.single(Token::Colon),
            Some('@') => self.single(Token::At),
            Some('[') => {
                self.advance();
                match self.current_char() {
                    Some(']') => self.single(Token::Flatten),
                    Some('?') => self.single(Token::Filter),
                    _ => Token::LBracket,
                }
            }
            Some('|') => self.either_or('|', Token::Or, Token::Pipe),
            Some('&') => self.either_or('&', Token::And, Token::Ampersand),
            Some('!') => self.either_or('=', Token::NotEq, Token::Not),
            Some('<') => self.either_or('=', Token::LtEq, Token::Lt),
            Some('>') => self.either_or('=', Token::GtEq, Token::Gt),
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.single(Token::EqEq)
                } else {
                    return Err(self.error("unexpected '=' (did you mean '=='?)"));
                }
            }
            Some('"') => Token::QuotedIdentifier(self.read_quoted_identifier(start)?),
            Some('\'') => Token::RawString(self.read_raw_string(start)?),
            Some('`') => Token::Literal(self.read_literal(start)?),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => Token::Identifier(self.read_identifier()),
            Some(ch) if ch.is_ascii_digit() || ch == '-' => self.read_number(start)?,
            Some(_) => return Err(self.error("unexpected character")),
        };

        Ok(Lexed { token, position: start })
    }
}

#[cfg(test)]
fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|lexed| lexed.token)
        .collect()
}

#[test]
fn test_operators() {
    assert_eq!(
        tokens("a || b && !c | d"),
        vec![
            Token::Identifier("a".into()),
            Token::Or,
            Token::Identifier("b".into()),
            Token::And,
            Token::Not,
            Token::Identifier("c".into()),
            Token::Pipe,
            Token::Identifier("d".into()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_brackets() {
    assert_eq!(
        tokens("[] [? [*] [-1]"),
        vec![
            Token::Flatten,
            Token::Filter,
            Token::LBracket,
            Token::Star,
            Token::RBracket,
            Token::LBracket,
            Token::Number(-1),
            Token::RBracket,
            Token::Eof,
        ]
    );
}

#[test]
fn test_positions() {
    let lexed = Lexer::new("foo\n  .bar").tokenize().unwrap();
    assert_eq!(lexed[0].position, Position::new(1, 1));
    assert_eq!(lexed[1].position, Position::new(2, 3));
    assert_eq!(lexed[2].position, Position::new(2, 4));
}

#[test]
fn test_lone_equals() {
    let err = Lexer::new("a = b").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 3));
}
