use std::mem::discriminant;

use crate::{
    ast::{Binary, ComparatorType, ExprKind, Expression, Token},
    lexer::{Lexed, Lexer, Position, SyntaxError},
};

/// Deepest expression nesting accepted before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Binding power below which a token ends a projection's right-hand side.
const PROJECTION_STOP: u8 = 10;

/// A top-down operator precedence (Pratt) parser.
///
/// Pipes bind loosest, then `||`, `&&`, comparisons, flatten, wildcards,
/// filters, and finally `.`/`[`/`(` chaining, which binds tightest.
pub struct Parser {
    tokens: Vec<Lexed>,
    index: usize,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, SyntaxError> {
        Ok(Parser {
            tokens: lexer.tokenize()?,
            index: 0,
            depth: 0,
        })
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub fn parse(&mut self) -> Result<Expression, SyntaxError> {
        let expr = self.expression(0)?;
        self.expect(Token::Eof, "unexpected token after end of expression")?;
        Ok(expr)
    }

    fn peek(&self) -> &Lexed {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Lexed {
        // tokenize() always ends with Eof, so the last token is a safe fallback
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + offset).min(last)]
    }

    fn advance(&mut self) -> Lexed {
        let lexed = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        lexed
    }

    fn check(&self, token: &Token) -> bool {
        discriminant(&self.peek().token) == discriminant(token)
    }

    fn expect(&mut self, expected: Token, message: &str) -> Result<Lexed, SyntaxError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_peek(message))
        }
    }

    fn error_at_peek(&self, message: &str) -> SyntaxError {
        let lexed = self.peek();
        SyntaxError::new(message, lexed.token.to_string(), lexed.position)
    }

    fn expression(&mut self, rbp: u8) -> Result<Expression, SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error_at_peek("expression nests too deeply"));
        }

        let mut left = self.nud()?;
        while rbp < self.peek().token.lbp() {
            left = self.led(left)?;
        }

        self.depth -= 1;
        Ok(left)
    }

    /// Tokens that start an expression.
    fn nud(&mut self) -> Result<Expression, SyntaxError> {
        let Lexed { token, position } = self.advance();

        match token {
            Token::At => Ok(Expression::current(position)),
            Token::Identifier(name) => {
                // foo( starts a function call
                if self.check(&Token::LParen) {
                    self.advance();
                    let args = self.parse_list(Token::RParen)?;
                    Ok(Expression::new(ExprKind::Function { name, args }, position))
                } else {
                    Ok(Expression::new(ExprKind::Field(name), position))
                }
            }
            Token::QuotedIdentifier(name) => Ok(Expression::new(ExprKind::Field(name), position)),
            Token::Literal(value) => Ok(Expression::new(ExprKind::Literal(value), position)),
            Token::RawString(value) => Ok(Expression::new(ExprKind::RawString(value), position)),
            Token::Star => self.parse_wildcard_object(Expression::current(position), position),
            Token::LBracket => self.parse_nud_lbracket(position),
            Token::LBrace => self.parse_multi_select_hash(position),
            Token::Flatten => self.parse_flatten(Expression::current(position), position),
            Token::Filter => self.parse_filter(Expression::current(position), position),
            Token::Ampersand => {
                let inner = self.expression(Token::Ampersand.lbp())?;
                Ok(Expression::new(ExprKind::ExpressionRef(Box::new(inner)), position))
            }
            Token::Not => {
                let inner = self.expression(Token::Not.lbp())?;
                Ok(Expression::new(ExprKind::Not(Box::new(inner)), position))
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen, "expected ')'")?;
                Ok(inner)
            }
            token => Err(SyntaxError::new(
                "unexpected token at start of expression",
                token.to_string(),
                position,
            )),
        }
    }

    /// Tokens that continue an expression.
    fn led(&mut self, left: Expression) -> Result<Expression, SyntaxError> {
        let Lexed { token, position } = self.advance();

        match token {
            Token::Dot => {
                if self.check(&Token::Star) {
                    // foo.*
                    self.advance();
                    self.parse_wildcard_object(left, position)
                } else {
                    let right = self.parse_dot_rhs(Token::Dot.lbp())?;
                    Ok(Expression::new(ExprKind::Subexpression(Binary::new(left, right)), position))
                }
            }
            Token::Flatten => self.parse_flatten(left, position),
            Token::Filter => self.parse_filter(left, position),
            Token::Or => {
                let right = self.expression(Token::Or.lbp())?;
                Ok(Expression::new(ExprKind::Or(Binary::new(left, right)), position))
            }
            Token::And => {
                let right = self.expression(Token::And.lbp())?;
                Ok(Expression::new(ExprKind::And(Binary::new(left, right)), position))
            }
            Token::Pipe => {
                let right = self.expression(Token::Pipe.lbp())?;
                Ok(Expression::new(ExprKind::Pipe(Binary::new(left, right)), position))
            }
            Token::LBracket => match self.peek().token {
                Token::Star => self.parse_wildcard_index(left, position),
                Token::Number(_) | Token::Colon => {
                    let right = self.parse_index(position)?;
                    Ok(Expression::new(ExprKind::Subexpression(Binary::new(left, right)), position))
                }
                _ => Err(self.error_at_peek("expected a number, ':' or '*' after '['")),
            },
            Token::EqEq => self.parse_comparison(ComparatorType::Equal, left, position),
            Token::NotEq => self.parse_comparison(ComparatorType::NotEqual, left, position),
            Token::Lt => self.parse_comparison(ComparatorType::LessThan, left, position),
            Token::LtEq => self.parse_comparison(ComparatorType::LessEqual, left, position),
            Token::Gt => self.parse_comparison(ComparatorType::GreaterThan, left, position),
            Token::GtEq => self.parse_comparison(ComparatorType::GreaterEqual, left, position),
            token => Err(SyntaxError::new("unexpected token", token.to_string(), position)),
        }
    }

    fn parse_nud_lbracket(&mut self, position: Position) -> Result<Expression, SyntaxError> {
        match self.peek().token {
            Token::Number(_) | Token::Colon => self.parse_index(position),
            // a nud [*] projects the current node
            Token::Star if matches!(self.peek_at(1).token, Token::RBracket) => {
                self.parse_wildcard_index(Expression::current(position), position)
            }
            _ => self.parse_multi_select_list(position),
        }
    }

    /// Parses `[0]`, `[1:]`, `[::-1]` and so on, after the `[`.
    fn parse_index(&mut self, position: Position) -> Result<Expression, SyntaxError> {
        let mut parts: [Option<i64>; 3] = [None, None, None];
        let mut slot = 0;

        loop {
            match self.peek().token {
                Token::Number(n) => {
                    self.advance();
                    parts[slot] = Some(n);
                    if !self.check(&Token::Colon) && !self.check(&Token::RBracket) {
                        return Err(self.error_at_peek("expected ':' or ']'"));
                    }
                }
                Token::Colon => {
                    self.advance();
                    slot += 1;
                    if slot == 3 {
                        return Err(self.error_at_peek("too many colons in slice expression"));
                    }
                }
                Token::RBracket => break,
                _ => return Err(self.error_at_peek("expected a number, ':' or ']'")),
            }
        }
        self.expect(Token::RBracket, "expected ']'")?;

        if slot == 0 {
            let index = parts[0].ok_or_else(|| self.error_at_peek("expected an index"))?;
            return Ok(Expression::new(ExprKind::Index(index), position));
        }

        // Anything selecting more than one element projects.
        let slice = Expression::new(
            ExprKind::Slice {
                start: parts[0],
                stop: parts[1],
                step: parts[2].unwrap_or(1),
            },
            position,
        );
        let right = self.parse_projection_rhs(Token::Star.lbp())?;
        Ok(Expression::new(ExprKind::Projection(Binary::new(slice, right)), position))
    }

    /// Comma separated expressions up to `closing`, which is consumed.
    fn parse_list(&mut self, closing: Token) -> Result<Vec<Expression>, SyntaxError> {
        let mut items = Vec::new();

        while !self.check(&closing) {
            items.push(self.expression(0)?);

            if self.check(&Token::Comma) {
                self.advance();
                if self.check(&closing) {
                    return Err(self.error_at_peek("trailing ','"));
                }
            } else if !self.check(&closing) {
                return Err(self.error_at_peek(&format!("expected ',' or {closing}")));
            }
        }

        self.expect(closing, "unclosed list")?;
        Ok(items)
    }

    fn parse_multi_select_list(&mut self, position: Position) -> Result<Expression, SyntaxError> {
        if self.check(&Token::RBracket) {
            return Err(self.error_at_peek("empty multi-select list"));
        }
        let items = self.parse_list(Token::RBracket)?;
        Ok(Expression::new(ExprKind::MultiSelectList(items), position))
    }

    fn parse_multi_select_hash(&mut self, position: Position) -> Result<Expression, SyntaxError> {
        let mut entries = Vec::new();

        loop {
            let key = match self.advance() {
                Lexed {
                    token: Token::Identifier(key) | Token::QuotedIdentifier(key),
                    ..
                } => key,
                Lexed { token, position } => {
                    return Err(SyntaxError::new(
                        "expected a key in multi-select hash",
                        token.to_string(),
                        position,
                    ));
                }
            };
            self.expect(Token::Colon, "expected ':' after key")?;
            let value = self.expression(0)?;
            entries.push((key, value));

            match self.peek().token {
                Token::Comma => {
                    self.advance();
                }
                Token::RBrace => break,
                _ => return Err(self.error_at_peek("expected ',' or '}'")),
            }
        }

        self.expect(Token::RBrace, "expected '}'")?;
        Ok(Expression::new(ExprKind::MultiSelectHash(entries), position))
    }

    /// `[*]` projecting `left`; the `[` is already consumed.
    fn parse_wildcard_index(&mut self, left: Expression, position: Position) -> Result<Expression, SyntaxError> {
        self.expect(Token::Star, "expected '*'")?;
        self.expect(Token::RBracket, "expected ']'")?;
        let right = self.parse_projection_rhs(Token::Star.lbp())?;
        Ok(Expression::new(ExprKind::Projection(Binary::new(left, right)), position))
    }

    /// `*` projecting the values of `left`.
    fn parse_wildcard_object(&mut self, left: Expression, position: Position) -> Result<Expression, SyntaxError> {
        let right = self.parse_projection_rhs(Token::Star.lbp())?;
        Ok(Expression::new(ExprKind::ObjectProjection(Binary::new(left, right)), position))
    }

    /// `[]` flattens `left` and projects the result.
    fn parse_flatten(&mut self, left: Expression, position: Position) -> Result<Expression, SyntaxError> {
        let flatten = Expression::new(ExprKind::Flatten(Box::new(left)), position);
        let right = self.parse_projection_rhs(Token::Flatten.lbp())?;
        Ok(Expression::new(ExprKind::Projection(Binary::new(flatten, right)), position))
    }

    /// `[?cond]` after the `[?`.
    fn parse_filter(&mut self, left: Expression, position: Position) -> Result<Expression, SyntaxError> {
        let condition = self.expression(0)?;
        self.expect(Token::RBracket, "expected ']' to close filter")?;
        let right = self.parse_projection_rhs(Token::Filter.lbp())?;
        Ok(Expression::new(
            ExprKind::FilterProjection {
                operands: Binary::new(left, right),
                condition: Box::new(condition),
            },
            position,
        ))
    }

    fn parse_comparison(
        &mut self,
        comparator: ComparatorType,
        left: Expression,
        position: Position,
    ) -> Result<Expression, SyntaxError> {
        let right = self.expression(Token::EqEq.lbp())?;
        Ok(Expression::new(
            ExprKind::Comparison {
                comparator,
                operands: Binary::new(left, right),
            },
            position,
        ))
    }

    /// What a projection applies to each element.
    fn parse_projection_rhs(&mut self, rbp: u8) -> Result<Expression, SyntaxError> {
        let next = self.peek();
        match next.token {
            Token::Dot => {
                self.advance();
                self.parse_dot_rhs(rbp)
            }
            Token::LBracket | Token::Filter => self.expression(rbp),
            ref token if token.lbp() < PROJECTION_STOP => Ok(Expression::current(next.position)),
            _ => Err(self.error_at_peek("invalid token after projection")),
        }
    }

    /// What may follow a `.`.
    fn parse_dot_rhs(&mut self, rbp: u8) -> Result<Expression, SyntaxError> {
        match self.peek().token {
            Token::LBracket => {
                let Lexed { position, .. } = self.advance();
                self.parse_multi_select_list(position)
            }
            Token::LBrace | Token::Star | Token::Identifier(_) | Token::QuotedIdentifier(_) => self.expression(rbp),
            _ => Err(self.error_at_peek("expected an identifier, '*', '[' or '{' after '.'")),
        }
    }
}
