//! Literal tokenizer
//!
//! Splits a config value into tokens for the `pcast` parser.

use crate::error::{CastError, Result};

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),
    Name(String),

    // Operators
    Plus,
    Minus,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,

    // Special
    Eof,
}

/// A token with position information
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Lexer over a single value string
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let (line, column) = (self.line, self.column);

        let Some((pos, c)) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, line, column));
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,

            '"' | '\'' => self.string(c, column)?,

            c if c.is_ascii_digit() => self.number(pos, column)?,
            '.' if self.peek().map_or(false, |n| n.is_ascii_digit()) => self.number(pos, column)?,

            c if c.is_alphabetic() || c == '_' => self.name(pos),

            _ => {
                return Err(CastError::syntax(
                    format!("Unexpected character '{}'", c),
                    column,
                ));
            }
        };

        Ok(Token::new(kind, line, column))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, c)) = result {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn match_char(&mut self, expected: impl Fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if expected(c) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.match_char(char::is_whitespace) {}
    }

    fn current_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(pos, _)| *pos)
            .unwrap_or(self.source.len())
    }

    fn string(&mut self, quote: char, column: usize) -> Result<TokenKind> {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, c)) => match escaped(c) {
                        Some(e) => value.push(e),
                        None => {
                            value.push('\\');
                            value.push(c);
                        }
                    },
                    None => return Err(CastError::syntax("Unterminated string", column)),
                },
                Some((_, c)) => value.push(c),
                None => return Err(CastError::syntax("Unterminated string", column)),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn number(&mut self, start: usize, column: usize) -> Result<TokenKind> {
        if &self.source[start..start + 1] == "0"
            && self.match_char(|c| matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            while self.match_char(|c| c.is_ascii_alphanumeric()) {}
            let text = &self.source[start..self.current_offset()];
            return parse_integer(text)
                .map(TokenKind::Int)
                .ok_or_else(|| CastError::syntax(format!("Invalid number: {}", text), column));
        }

        let mut is_float = &self.source[start..start + 1] == ".";
        while self.match_char(|c| c.is_ascii_digit()) {}

        if !is_float && self.match_char(|c| c == '.') {
            is_float = true;
        }
        while self.match_char(|c| c.is_ascii_digit()) {}

        if self.match_char(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.match_char(|c| c == '+' || c == '-');
            if !self.match_char(|c| c.is_ascii_digit()) {
                return Err(CastError::syntax("Malformed exponent", column));
            }
            while self.match_char(|c| c.is_ascii_digit()) {}
        }

        let text = &self.source[start..self.current_offset()];
        if !is_float {
            if let Some(n) = parse_integer(text) {
                return Ok(TokenKind::Int(n));
            }
        }

        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| CastError::syntax(format!("Invalid number: {}", text), column))
    }

    fn name(&mut self, start: usize) -> TokenKind {
        while self.match_char(|c| c.is_alphanumeric() || c == '_') {}
        let end = self.current_offset();
        TokenKind::Name(self.source[start..end].to_string())
    }
}

/// Parse an integer literal with an optional sign and `0x`/`0o`/`0b` prefix
pub fn parse_integer(text: &str) -> Option<i64> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = match body.get(..2) {
        Some("0x") | Some("0X") => (16, &body[2..]),
        Some("0o") | Some("0O") => (8, &body[2..]),
        Some("0b") | Some("0B") => (2, &body[2..]),
        _ => (10, body),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Character produced by `\c` inside a quoted string. Unknown escapes
/// keep their backslash.
pub(crate) fn escaped(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        '\\' | '\'' | '"' => Some(c),
        _ => None,
    }
}

/// Resolve escapes in the body of a quoted string
pub(crate) fn unescape(body: &str) -> String {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => match escaped(next) {
                Some(e) => value.push(e),
                None => {
                    value.push('\\');
                    value.push(next);
                }
            },
            None => value.push('\\'),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.5 .5 1e3 0x1F 0b101"),
            vec![
                TokenKind::Int(42),
                TokenKind::Float(3.5),
                TokenKind::Float(0.5),
                TokenKind::Float(1000.0),
                TokenKind::Int(31),
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        assert_eq!(
            kinds("99999999999999999999")[0],
            TokenKind::Float(99999999999999999999.0)
        );
    }

    #[test]
    fn test_strings_and_names() {
        assert_eq!(
            kinds(r#"'a b' "it's" Vec"#),
            vec![
                TokenKind::String("a b".into()),
                TokenKind::String("it's".into()),
                TokenKind::Name("Vec".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(kinds(r"'it\'s'")[0], TokenKind::String("it's".into()));
    }

    #[test]
    fn test_unescape_matches_lexer() {
        for body in [r#"it\'s \"x\""#, r"a\\n", r"tail\\", r"keep\q"] {
            let quoted = format!("'{}'", body);
            assert_eq!(kinds(&quoted)[0], TokenKind::String(unescape(body)), "{}", body);
        }
        assert_eq!(unescape(r"a\\n"), "a\\n");
        assert_eq!(unescape(r"keep\q"), "keep\\q");
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            kinds("{[(-+,:)]}"),
            vec![
                TokenKind::LBrace,
                TokenKind::LBracket,
                TokenKind::LParen,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::RParen,
                TokenKind::RBracket,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_columns() {
        let tokens = Lexer::new("[1,  2]").tokenize().unwrap();
        assert_eq!(tokens[3].column, 6);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("'open").tokenize(),
            Err(CastError::Syntax { column: 1, .. })
        ));
        assert!(Lexer::new("1 @ 2").tokenize().is_err());
        assert!(Lexer::new("1e").tokenize().is_err());
        assert!(Lexer::new("0xZZ").tokenize().is_err());
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("-0x10"), Some(-16));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer("0x"), None);
    }
}
