use logos::Logos;
use std::fmt;

use crate::source::{BytePos, ByteRange, MAX_SOURCE_LEN};

pub const KEYWORDS: &[&str] = &["Enum", "Record", "Var"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Logos)]
pub enum Token<'source> {
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Name(&'source str),
    #[regex(r"[0-9]+")]
    Number(&'source str),

    #[token("Enum")]
    KeywordEnum,
    #[token("Record")]
    KeywordRecord,
    #[token("Var")]
    KeywordVar,

    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[error]
    #[regex(r"\p{Whitespace}", logos::skip)]
    Error,
}

pub type Spanned<Tok, Loc> = (Loc, Tok, Loc);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedCharacter { range: ByteRange },
}

impl Error {
    pub fn range(&self) -> ByteRange {
        match self {
            Error::UnexpectedCharacter { range } => *range,
        }
    }
}

pub fn tokens(source: &str) -> impl Iterator<Item = Result<Spanned<Token<'_>, BytePos>, Error>> {
    assert!(
        source.len() <= MAX_SOURCE_LEN,
        "`source` must be less than 4GiB in length"
    );

    Token::lexer(source).spanned().map(|(token, range)| {
        let start = range.start as BytePos;
        let end = range.end as BytePos;
        match token {
            Token::Error => Err(Error::UnexpectedCharacter {
                range: ByteRange::new(start, end),
            }),
            token => Ok((start, token, end)),
        }
    })
}

impl<'source> Token<'source> {
    pub fn description(&self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::Number(_) => "integer literal",
            Token::KeywordEnum => "Enum",
            Token::KeywordRecord => "Record",
            Token::KeywordVar => "Var",
            Token::Comma => ",",
            Token::Equals => "=",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Error => "error",
        }
    }
}

impl<'source> fmt::Display for Token<'source> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => f.write_str(name),
            Token::Number(number) => f.write_str(number),
            token => f.write_str(token.description()),
        }
    }
}
