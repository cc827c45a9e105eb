//! S-expression reader
//!
//! SMT-LIB scripts are sequences of s-expressions. The reader keeps the
//! byte offset of every list so elaboration errors can point at input.

use crate::error::{SmtError, SmtResult};
use crate::lexer::Token;
use logos::Logos;
use std::fmt;

/// An s-expression
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Symbol(String),
    Keyword(String),
    Numeral(String),
    Decimal(String),
    Bitvector(String),
    String(String),
    True,
    False,
    /// A list together with the offset of its opening parenthesis
    List(Vec<SExpr>, usize),
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Symbol(s) => crate::term::write_symbol(f, s),
            SExpr::Keyword(s)
            | SExpr::Numeral(s)
            | SExpr::Decimal(s)
            | SExpr::Bitvector(s)
            | SExpr::String(s) => write!(f, "{s}"),
            SExpr::True => write!(f, "true"),
            SExpr::False => write!(f, "false"),
            SExpr::List(items, _) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl SExpr {
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items, _) => Some(items),
            _ => None,
        }
    }

    /// Byte offset of a list, if known
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            SExpr::List(_, pos) => Some(*pos),
            _ => None,
        }
    }
}

/// Streaming s-expression reader over a logos token stream
pub struct SExprReader<'a> {
    lexer: logos::Lexer<'a, Token<'a>>,
    current: Option<Result<Token<'a>, ()>>,
}

impl<'a> SExprReader<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Token::lexer(input);
        let current = lexer.next();
        SExprReader { lexer, current }
    }

    /// True once every token has been consumed
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.current.is_none()
    }

    fn advance(&mut self) {
        self.current = self.lexer.next();
    }

    /// Read one s-expression
    pub fn read(&mut self) -> SmtResult<SExpr> {
        let start = self.lexer.span().start;
        let atom = match self.current.take() {
            None => return Err(SmtError::parse("unexpected end of input", None)),
            Some(Err(())) => {
                return Err(SmtError::parse(
                    format!("invalid token `{}`", self.lexer.slice()),
                    Some(start),
                ))
            }
            Some(Ok(Token::LParen)) => return self.read_list(start),
            Some(Ok(Token::RParen)) => return Err(SmtError::parse("unexpected `)`", Some(start))),
            Some(Ok(Token::Symbol(s))) => SExpr::Symbol(s.to_string()),
            Some(Ok(Token::QuotedSymbol(s))) => SExpr::Symbol(s[1..s.len() - 1].to_string()),
            Some(Ok(Token::Keyword(k))) => SExpr::Keyword(k.to_string()),
            Some(Ok(Token::Numeral(n))) => SExpr::Numeral(n.to_string()),
            Some(Ok(Token::Decimal(d))) => SExpr::Decimal(d.to_string()),
            Some(Ok(Token::Bitvector(b))) => SExpr::Bitvector(b.to_string()),
            Some(Ok(Token::String(s))) => SExpr::String(s.to_string()),
            Some(Ok(Token::True)) => SExpr::True,
            Some(Ok(Token::False)) => SExpr::False,
        };
        self.advance();
        Ok(atom)
    }

    fn read_list(&mut self, start: usize) -> SmtResult<SExpr> {
        self.advance();
        let mut items = Vec::new();
        loop {
            match &self.current {
                None => {
                    return Err(SmtError::parse("unclosed `(`", Some(start)));
                }
                Some(Ok(Token::RParen)) => {
                    self.advance();
                    return Ok(SExpr::List(items, start));
                }
                Some(_) => items.push(self.read()?),
            }
        }
    }

    /// Read every remaining s-expression
    pub fn read_all(&mut self) -> SmtResult<Vec<SExpr>> {
        let mut result = Vec::new();
        while !self.is_eof() {
            result.push(self.read()?);
        }
        Ok(result)
    }
}

/// Read all s-expressions in `input`
pub fn read_sexps(input: &str) -> SmtResult<Vec<SExpr>> {
    SExprReader::new(input).read_all()
}
