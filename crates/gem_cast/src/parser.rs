//! Recursive-descent literal parser (`pcast`)
//!
//! Grammar:
//!
//! ```text
//! value    := dict | list | tuple | STRING | number | name
//! dict     := '{' (value ':' value (',' value ':' value)* ','?)? '}'
//! list     := '[' (value (',' value)* ','?)? ']'
//! tuple    := '(' (value (',' value)* ','?)? ')'
//! number   := ('+' | '-')? (INT | FLOAT)
//! name     := ('vec' | 'point') '(' number (',' number)* ','? ')'
//!           | 'bit' '(' (number (',' number)* ','?)? ')'
//!           | 'true' | 'false' | 'none'
//!           | NAME
//! ```
//!
//! Keyword names are case-insensitive; any other bare name is a string.

use crate::error::{CastError, Result};
use crate::lexer::{Token, TokenKind};
use crate::value::{bit, insert_pair, Value, Vector, VectorKind};

/// Parser over a tokenized value
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse exactly one value; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Value> {
        let value = self.value()?;
        if let Some(token) = self.peek().filter(|t| t.kind != TokenKind::Eof) {
            return Err(CastError::syntax(
                format!("Malformed expression near {:?}", token.kind),
                token.column,
            ));
        }
        Ok(value)
    }

    fn value(&mut self) -> Result<Value> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::LBrace => self.dict(),
            TokenKind::LBracket => self.sequence(&TokenKind::RBracket).map(Value::List),
            TokenKind::LParen => self.sequence(&TokenKind::RParen).map(Value::Tuple),
            TokenKind::String(s) => Ok(Value::String(s)),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Int(_) | TokenKind::Float(_) => {
                self.number(token)
            }
            TokenKind::Name(name) => self.name(name, token.column),
            other => Err(CastError::syntax(
                format!("Unexpected token {:?}", other),
                token.column,
            )),
        }
    }

    fn dict(&mut self) -> Result<Value> {
        let mut pairs = Vec::new();

        while !self.match_token(&TokenKind::RBrace) {
            let key = self.value()?;
            self.consume(&TokenKind::Colon, "malformed dictionary")?;
            let value = self.value()?;
            insert_pair(&mut pairs, key, value);

            if !self.match_token(&TokenKind::Comma) && !self.check(&TokenKind::RBrace) {
                return Err(self.error_here("malformed dictionary"));
            }
        }

        Ok(Value::Dict(pairs))
    }

    fn sequence(&mut self, end: &TokenKind) -> Result<Vec<Value>> {
        let mut items = Vec::new();

        while !self.match_token(end) {
            items.push(self.value()?);

            if !self.match_token(&TokenKind::Comma) && !self.check(end) {
                return Err(self.error_here("Malformed sequence"));
            }
        }

        Ok(items)
    }

    fn number(&mut self, first: Token) -> Result<Value> {
        let (sign, token) = match first.kind {
            TokenKind::Plus => (1, self.advance()?),
            TokenKind::Minus => (-1, self.advance()?),
            _ => (1, first),
        };

        match token.kind {
            TokenKind::Int(n) => Ok(Value::Int(sign * n)),
            TokenKind::Float(f) => Ok(Value::Float(sign as f64 * f)),
            TokenKind::Name(name) => match special_float(&name) {
                Some(f) => Ok(Value::Float(sign as f64 * f)),
                None => Err(CastError::syntax(
                    format!("Expected number, found {}", name),
                    token.column,
                )),
            },
            other => Err(CastError::syntax(
                format!("Expected number, found {:?}", other),
                token.column,
            )),
        }
    }

    fn name(&mut self, name: String, column: usize) -> Result<Value> {
        if let Some(f) = special_float(&name) {
            return Ok(Value::Float(f));
        }
        match name.to_lowercase().as_str() {
            "vec" => self.vector(VectorKind::Vec, column),
            "point" => self.vector(VectorKind::Point, column),
            "bit" => self.bit_mask(column),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "none" => Ok(Value::None),
            _ => Ok(Value::String(name)),
        }
    }

    fn vector(&mut self, kind: VectorKind, column: usize) -> Result<Value> {
        let components = self
            .arguments(column)?
            .into_iter()
            .map(|n| match n {
                Value::Int(i) => i as f64,
                Value::Float(f) => f,
                _ => 0.0,
            })
            .collect();

        Vector::new(kind, components).map(Value::Vector)
    }

    fn bit_mask(&mut self, column: usize) -> Result<Value> {
        let mut mask = 0u32;
        for arg in self.arguments(column)? {
            match arg {
                Value::Int(index) => mask |= bit(index)?,
                other => {
                    return Err(CastError::Value(format!(
                        "Bit index must be an integer, found {}",
                        other
                    )))
                }
            }
        }
        Ok(Value::BitMask(mask))
    }

    /// Parenthesized, comma-separated numbers following a constructor name
    fn arguments(&mut self, column: usize) -> Result<Vec<Value>> {
        if !self.match_token(&TokenKind::LParen) {
            return Err(CastError::syntax("Malformed expression", column));
        }

        let mut args = Vec::new();
        while !self.match_token(&TokenKind::RParen) {
            let token = self.advance()?;
            args.push(self.number(token)?);

            if !self.match_token(&TokenKind::Comma) && !self.check(&TokenKind::RParen) {
                return Err(self.error_here("Malformed expression"));
            }
        }
        Ok(args)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        self.peek()
            .map(|t| matches!(t.kind, TokenKind::Eof))
            .unwrap_or(true)
    }

    /// Take the next token, failing at end of input
    fn advance(&mut self) -> Result<Token> {
        if self.is_at_end() {
            return Err(self.error_here("Unexpected end of input"));
        }
        self.current += 1;
        self.tokens
            .get(self.current - 1)
            .cloned()
            .ok_or_else(|| CastError::syntax("Unexpected end of input", 0))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek()
            .map(|t| std::mem::discriminant(&t.kind) == std::mem::discriminant(kind))
            .unwrap_or(false)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) && !self.is_at_end() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> CastError {
        let column = self.peek().map(|t| t.column).unwrap_or(0);
        CastError::syntax(message, column)
    }
}

/// `nan`, `inf` and `infinity` in any case, as float parsing accepts them
fn special_float(name: &str) -> Option<f64> {
    match name.to_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "infinity" => Some(f64::INFINITY),
        _ => None,
    }
}
