//! SMT-LIB lexer
//!
//! Tokenizes SMT-LIB 2.6 scripts with logos. Bitvector and string
//! literals are recognized so the reader can reject them with a precise
//! message instead of a generic token error.

use logos::Logos;

/// SMT-LIB tokens
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(skip r";[^\n]*")]
pub enum Token<'a> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// Non-negative integer literal
    #[regex(r"[0-9]+", |lex| lex.slice())]
    Numeral(&'a str),

    /// Decimal literal such as `2.50`
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice())]
    Decimal(&'a str),

    /// `#x..` or `#b..` bitvector literal
    #[regex(r"#x[0-9a-fA-F]+|#b[01]+", |lex| lex.slice())]
    Bitvector(&'a str),

    /// String literal, quotes included
    #[regex(r#""([^"]|"")*""#, |lex| lex.slice())]
    String(&'a str),

    /// Simple symbol
    #[regex(r"[a-zA-Z~!@$%^&*_+=<>.?/\-][a-zA-Z0-9~!@$%^&*_+=<>.?/\-]*", |lex| lex.slice())]
    Symbol(&'a str),

    /// `|...|` symbol, delimiters included
    #[regex(r"\|[^|\\]*\|", |lex| lex.slice())]
    QuotedSymbol(&'a str),

    /// `:keyword`
    #[regex(r":[a-zA-Z0-9~!@$%^&*_+=<>.?/\-]+", |lex| lex.slice())]
    Keyword(&'a str),

    #[token("true")]
    True,

    #[token("false")]
    False,
}

/// Returns true when `name` can be printed without `|...|` quoting.
#[must_use]
pub fn is_simple_symbol(name: &str) -> bool {
    if name.is_empty() || name == "true" || name == "false" {
        return false;
    }
    let mut lexer = Token::lexer(name);
    matches!(lexer.next(), Some(Ok(Token::Symbol(s))) if s == name) && lexer.next().is_none()
}
