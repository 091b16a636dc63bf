use std::fmt;

use crate::value::Value;

/// Lexical tokens of a JMESPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Names and literals
    /// Unquoted identifier
    ///
    /// # Examples
    /// ```text
    /// foo
    /// _private
    /// item2
    /// ```
    Identifier(String),

    /// Double-quoted identifier, JSON string escapes applied
    ///
    /// # Examples
    /// ```text
    /// "with space"
    /// "été"
    /// ```
    QuotedIdentifier(String),

    /// Signed integer inside brackets
    ///
    /// # Examples
    /// ```text
    /// 0
    /// -1
    /// ```
    Number(i64),

    /// JSON literal enclosed in backticks
    ///
    /// # Examples
    /// ```text
    /// `true`
    /// `{"a": [1, 2]}`
    /// ```
    Literal(Value),

    /// Raw string enclosed in single quotes, only `\'` is an escape
    RawString(String),

    // Punctuation
    /// `.`
    Dot,
    /// `*`
    Star,
    /// `[]`
    Flatten,
    /// `[?`
    Filter,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `@`
    At,
    /// `&` on its own, an expression reference
    Ampersand,

    // Operators
    /// `|`
    Pipe,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `!`
    Not,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,

    /// End of expression
    Eof,
}

impl Token {
    /// Left binding power used by the Pratt parser.
    ///
    /// Tokens that never continue an expression bind with 0.
    pub fn lbp(&self) -> u8 {
        match self {
            Token::Pipe => 1,
            Token::Or => 2,
            Token::And => 3,
            Token::EqEq | Token::NotEq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => 5,
            Token::Flatten => 9,
            Token::Star => 20,
            Token::Filter => 21,
            Token::Dot => 40,
            Token::Not => 45,
            Token::LBrace => 50,
            Token::LBracket => 55,
            Token::LParen => 60,
            _ => 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::QuotedIdentifier(name) => write!(f, "quoted identifier \"{name}\""),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Literal(_) => f.write_str("literal"),
            Token::RawString(s) => write!(f, "raw string '{s}'"),
            Token::Dot => f.write_str("'.'"),
            Token::Star => f.write_str("'*'"),
            Token::Flatten => f.write_str("'[]'"),
            Token::Filter => f.write_str("'[?'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::At => f.write_str("'@'"),
            Token::Ampersand => f.write_str("'&'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Or => f.write_str("'||'"),
            Token::And => f.write_str("'&&'"),
            Token::Not => f.write_str("'!'"),
            Token::EqEq => f.write_str("'=='"),
            Token::NotEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::LtEq => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::GtEq => f.write_str("'>='"),
            Token::Eof => f.write_str("end of expression"),
        }
    }
}
