//! Recursive descent parser for the surface language.
//!
//! ```text
//! shape   ::= operand ("," operand)*
//! operand ::= integer | name | record | enum | var | "(" shape ")"
//! record  ::= "Record" "(" field ("," field)* ")"
//! field   ::= label "=" operand
//! label   ::= name | "Record" | "Enum" | "Var"
//! enum    ::= "Enum" "(" integer ("," integer)* ")"
//! var     ::= "Var" "(" integer "," integer ")"
//! ```
//!
//! A single token of lookahead is enough to choose between productions.
//! Parenthesized groups are tracked on an explicit stack, while records
//! recurse and are limited to [`MAX_RECORD_DEPTH`] levels of nesting.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use itertools::Itertools;
use scoped_arena::Scope;
use std::iter::Peekable;

use crate::source::{BytePos, ByteRange};
use crate::surface::lexer::{self, Spanned, Token};
use crate::surface::{Field, Shape, Term};
use crate::symbol::Symbol;

const OPERAND: &[&str] = &[
    "integer literal",
    "name",
    "`Record`",
    "`Enum`",
    "`Var`",
    "`(`",
];
const INTEGER: &[&str] = &["integer literal"];
const NAME: &[&str] = &["name"];
const OPEN_PAREN: &[&str] = &["`(`"];
const EQUALS: &[&str] = &["`=`"];
const COMMA: &[&str] = &["`,`"];
const COMMA_OR_CLOSE_PAREN: &[&str] = &["`,`", "`)`"];
const CLOSE_PAREN: &[&str] = &["`)`"];
const COMMA_OR_EOF: &[&str] = &["`,`", "end of input"];

/// The deepest nesting of records accepted by the parser.
pub const MAX_RECORD_DEPTH: usize = 64;

/// Errors produced when the input is not well-formed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected character")]
    UnexpectedCharacter { range: ByteRange },
    #[error("unexpected token `{found}`")]
    UnexpectedToken {
        range: ByteRange,
        found: String,
        expected: &'static [&'static str],
    },
    #[error("unexpected end of input")]
    UnexpectedEof {
        pos: BytePos,
        expected: &'static [&'static str],
    },
    #[error("unclosed parenthesis")]
    UnclosedParen { open_range: ByteRange, eof: BytePos },
    #[error("unknown type constructor `{name}`")]
    UnknownConstructor { range: ByteRange, name: String },
    #[error("integer literal is too large")]
    IntegerOverflow { range: ByteRange },
    #[error("records are nested too deeply")]
    NestingTooDeep { range: ByteRange, limit: usize },
}

impl From<lexer::Error> for SyntaxError {
    fn from(error: lexer::Error) -> SyntaxError {
        match error {
            lexer::Error::UnexpectedCharacter { range } => {
                SyntaxError::UnexpectedCharacter { range }
            }
        }
    }
}

impl SyntaxError {
    /// The range of the offending token.
    pub fn range(&self) -> ByteRange {
        match self {
            SyntaxError::UnexpectedCharacter { range }
            | SyntaxError::UnexpectedToken { range, .. }
            | SyntaxError::UnknownConstructor { range, .. }
            | SyntaxError::IntegerOverflow { range }
            | SyntaxError::NestingTooDeep { range, .. } => *range,
            SyntaxError::UnexpectedEof { pos, .. } => ByteRange::empty(*pos),
            SyntaxError::UnclosedParen { open_range, .. } => *open_range,
        }
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let primary_label = |range: &ByteRange| Label::primary(file_id, *range);
        let secondary_label = |range: &ByteRange| Label::secondary(file_id, *range);

        match self {
            SyntaxError::UnexpectedCharacter { range } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range)]),
            SyntaxError::UnexpectedToken {
                range, expected, ..
            } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range).with_message("unexpected token")])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            SyntaxError::UnexpectedEof { pos, expected } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![
                    primary_label(&ByteRange::empty(*pos)).with_message("unexpected end of input")
                ])
                .with_notes(format_expected(expected).map_or(Vec::new(), |message| vec![message])),
            SyntaxError::UnclosedParen { open_range, eof } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![
                    primary_label(&ByteRange::empty(*eof)).with_message("expected `)`"),
                    secondary_label(open_range).with_message("unclosed `(`"),
                ]),
            SyntaxError::UnknownConstructor { range, .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range).with_message("unknown constructor")])
                .with_notes(vec![format!(
                    "type constructors are {}",
                    lexer::KEYWORDS.iter().map(|k| format!("`{k}`")).join(", "),
                )]),
            SyntaxError::IntegerOverflow { range } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range)])
                .with_notes(vec![format!("the largest supported integer is {}", u64::MAX)]),
            SyntaxError::NestingTooDeep { range, limit } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range)])
                .with_notes(vec![format!("records may be nested at most {limit} deep")]),
        }
    }
}

fn format_expected(expected: &[impl std::fmt::Display]) -> Option<String> {
    expected.split_last().map(|items| match items {
        (last, []) => format!("expected {last}"),
        (last, expected) => format!("expected {} or {}", expected.iter().format(", "), last),
    })
}

pub fn parse_shape<'arena>(
    scope: &'arena Scope<'arena>,
    source: &str,
) -> Result<Shape<'arena>, SyntaxError> {
    let mut parser = Parser {
        scope,
        tokens: lexer::tokens(source).peekable(),
        eof: source.len() as BytePos,
        record_depth: 0,
    };
    parser.shape()
}

struct Parser<'arena, Tokens: Iterator> {
    scope: &'arena Scope<'arena>,
    tokens: Peekable<Tokens>,
    eof: BytePos,
    record_depth: usize,
}

impl<'arena, 'source, Tokens> Parser<'arena, Tokens>
where
    Tokens: Iterator<Item = Result<Spanned<Token<'source>, BytePos>, lexer::Error>>,
{
    fn peek(&mut self) -> Result<Option<Token<'source>>, SyntaxError> {
        match self.tokens.peek() {
            None => Ok(None),
            Some(Ok((_, token, _))) => Ok(Some(*token)),
            Some(Err(error)) => Err(SyntaxError::from(error.clone())),
        }
    }

    fn next(&mut self) -> Result<Option<(ByteRange, Token<'source>)>, SyntaxError> {
        match self.tokens.next() {
            None => Ok(None),
            Some(Ok((start, token, end))) => Ok(Some((ByteRange::new(start, end), token))),
            Some(Err(error)) => Err(SyntaxError::from(error)),
        }
    }

    /// Consume the next token, failing at the end of the input.
    fn expect_next(
        &mut self,
        expected: &'static [&'static str],
    ) -> Result<(ByteRange, Token<'source>), SyntaxError> {
        match self.next()? {
            Some(next) => Ok(next),
            None => Err(SyntaxError::UnexpectedEof {
                pos: self.eof,
                expected,
            }),
        }
    }

    /// Consume a comma if one is next, returning `true` if it was present.
    fn eat_comma(&mut self) -> Result<bool, SyntaxError> {
        match self.peek()? {
            Some(Token::Comma) => {
                self.next()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn shape(&mut self) -> Result<Shape<'arena>, SyntaxError> {
        let operands = self.operands()?;

        match self.next()? {
            None => {
                let range = operands
                    .iter()
                    .map(Term::range)
                    .reduce(ByteRange::merge)
                    .unwrap_or_else(|| ByteRange::empty(0));
                Ok(Shape {
                    range,
                    operands: self.alloc_slice(operands),
                })
            }
            Some((range, token)) => Err(unexpected_token(range, token, COMMA_OR_EOF)),
        }
    }

    /// Parse a comma separated list of operands.
    ///
    /// Parenthesized groups in the list are tracked on an explicit stack
    /// rather than by recursion, so they can be nested to any depth.
    fn operands(&mut self) -> Result<Vec<Term<'arena>>, SyntaxError> {
        // The open parenthesis of each enclosing group, along with the
        // operands preceding that group
        let mut groups: Vec<(ByteRange, Vec<Term<'arena>>)> = Vec::new();
        let mut operands = Vec::new();

        loop {
            while let Some(Token::OpenParen) = self.peek()? {
                let (open_range, _) = self.expect_next(OPERAND)?;
                groups.push((open_range, std::mem::take(&mut operands)));
            }
            operands.push(self.operand()?);

            while !self.eat_comma()? {
                let (open_range, outer) = match groups.pop() {
                    Some(group) => group,
                    None => return Ok(operands),
                };
                let end = self.close_paren(open_range)?;
                let inner = std::mem::replace(&mut operands, outer);
                let inner = self.alloc_slice(inner);
                operands.push(Term::Paren(open_range.merge(end), inner));
            }
        }
    }

    fn operand(&mut self) -> Result<Term<'arena>, SyntaxError> {
        let (range, token) = self.expect_next(OPERAND)?;

        match token {
            Token::Number(number) => Ok(Term::Number(range, integer(range, number)?)),
            Token::Name(name) => match self.peek()? {
                Some(Token::OpenParen) => Err(SyntaxError::UnknownConstructor {
                    range,
                    name: name.to_owned(),
                }),
                _ => Ok(Term::Name(range, Symbol::intern(name))),
            },
            Token::KeywordRecord => self.record(range),
            Token::KeywordEnum => self.r#enum(range),
            Token::KeywordVar => self.var(range),
            Token::OpenParen => {
                let operands = self.operands()?;
                let end = self.close_paren(range)?;
                Ok(Term::Paren(range.merge(end), self.alloc_slice(operands)))
            }
            Token::Comma | Token::Equals | Token::CloseParen | Token::Error => {
                Err(unexpected_token(range, token, OPERAND))
            }
        }
    }

    fn record(&mut self, keyword_range: ByteRange) -> Result<Term<'arena>, SyntaxError> {
        if self.record_depth >= MAX_RECORD_DEPTH {
            return Err(SyntaxError::NestingTooDeep {
                range: keyword_range,
                limit: MAX_RECORD_DEPTH,
            });
        }
        let open_range = self.open_paren()?;

        self.record_depth += 1;
        let mut fields = vec![self.field()?];
        while self.eat_comma()? {
            fields.push(self.field()?);
        }
        self.record_depth -= 1;

        let end = self.close_paren(open_range)?;
        let fields: &'arena [Field<'arena>] = self.alloc_slice(fields);
        Ok(Term::Record(keyword_range.merge(end), fields))
    }

    fn field(&mut self) -> Result<Field<'arena>, SyntaxError> {
        // Keywords are only reserved in operand position
        let label = match self.expect_next(NAME)? {
            (range, Token::Name(name)) => (range, Symbol::intern(name)),
            (range, Token::KeywordEnum) => (range, Symbol::intern_static("Enum")),
            (range, Token::KeywordRecord) => (range, Symbol::intern_static("Record")),
            (range, Token::KeywordVar) => (range, Symbol::intern_static("Var")),
            (range, token) => return Err(unexpected_token(range, token, NAME)),
        };
        match self.expect_next(EQUALS)? {
            (_, Token::Equals) => {}
            (range, token) => return Err(unexpected_token(range, token, EQUALS)),
        }
        let r#type = self.operand()?;

        Ok((label, r#type))
    }

    fn r#enum(&mut self, keyword_range: ByteRange) -> Result<Term<'arena>, SyntaxError> {
        let open_range = self.open_paren()?;

        let mut values = vec![self.integer()?];
        while self.eat_comma()? {
            values.push(self.integer()?);
        }

        let end = self.close_paren(open_range)?;
        let values: &'arena [(ByteRange, u64)] = self.alloc_slice(values);
        Ok(Term::Enum(keyword_range.merge(end), values))
    }

    fn var(&mut self, keyword_range: ByteRange) -> Result<Term<'arena>, SyntaxError> {
        let open_range = self.open_paren()?;

        let lower = self.integer()?;
        match self.expect_next(COMMA)? {
            (_, Token::Comma) => {}
            (range, token) => return Err(unexpected_token(range, token, COMMA)),
        }
        let upper = self.integer()?;

        let end = self.close_paren(open_range)?;
        Ok(Term::Var(keyword_range.merge(end), lower, upper))
    }

    fn integer(&mut self) -> Result<(ByteRange, u64), SyntaxError> {
        match self.expect_next(INTEGER)? {
            (range, Token::Number(number)) => Ok((range, integer(range, number)?)),
            (range, token) => Err(unexpected_token(range, token, INTEGER)),
        }
    }

    fn open_paren(&mut self) -> Result<ByteRange, SyntaxError> {
        match self.expect_next(OPEN_PAREN)? {
            (range, Token::OpenParen) => Ok(range),
            (range, token) => Err(unexpected_token(range, token, OPEN_PAREN)),
        }
    }

    fn alloc_slice<T: 'arena>(&self, items: Vec<T>) -> &'arena [T] {
        let items: &'arena Vec<T> = self.scope.to_scope(items);
        items.as_slice()
    }

    /// Consume the parenthesis matching the one at `open_range`, returning
    /// its range.
    fn close_paren(&mut self, open_range: ByteRange) -> Result<ByteRange, SyntaxError> {
        match self.next()? {
            Some((range, Token::CloseParen)) => Ok(range),
            Some((range, token @ Token::Comma)) => Err(unexpected_token(range, token, CLOSE_PAREN)),
            Some((range, token)) => Err(unexpected_token(range, token, COMMA_OR_CLOSE_PAREN)),
            None => Err(SyntaxError::UnclosedParen {
                open_range,
                eof: self.eof,
            }),
        }
    }
}

fn unexpected_token(
    range: ByteRange,
    token: Token<'_>,
    expected: &'static [&'static str],
) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        range,
        found: token.to_string(),
        expected,
    }
}

fn integer(range: ByteRange, number: &str) -> Result<u64, SyntaxError> {
    number
        .parse()
        .map_err(|_| SyntaxError::IntegerOverflow { range })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(source: &str) -> SyntaxError {
        let scope = Scope::new();
        let result = parse_shape(&scope, source).map(|shape| shape.operands.len());
        result.unwrap_err()
    }

    #[test]
    fn operands_keep_their_ranges() {
        let scope = Scope::new();
        let shape = parse_shape(&scope, "800, Var(1, 2)").unwrap();

        assert_eq!(shape.range, ByteRange::new(0, 14));
        assert_eq!(shape.operands.len(), 2);
        assert_eq!(shape.operands[0].range(), ByteRange::new(0, 3));
        assert!(matches!(
            shape.operands[1],
            Term::Var(range, (_, 1), (_, 2)) if range == ByteRange::new(5, 14),
        ));
    }

    #[test]
    fn groups_are_kept_in_the_surface_tree() {
        let scope = Scope::new();
        let shape = parse_shape(&scope, "a, (b, (c))").unwrap();

        match shape.operands {
            [Term::Name(_, a), Term::Paren(range, [Term::Name(_, b), Term::Paren(_, [Term::Name(_, c)])])] =>
            {
                assert_eq!((*a, *b, *c), (Symbol::intern("a"), Symbol::intern("b"), Symbol::intern("c")));
                assert_eq!(*range, ByteRange::new(3, 11));
            }
            operands => panic!("unexpected operands: {operands:?}"),
        }
    }

    #[test]
    fn record_fields() {
        let scope = Scope::new();
        let shape = parse_shape(&scope, "Record(x = int64, y = (3, int32))").unwrap();

        match shape.operands {
            [Term::Record(_, [((_, x), Term::Name(..)), ((_, y), Term::Paren(..))])] => {
                assert_eq!(*x, "x");
                assert_eq!(*y, "y");
            }
            operands => panic!("unexpected operands: {operands:?}"),
        }
    }

    #[test]
    fn unclosed_paren() {
        assert_eq!(
            parse_err("a, (b, c"),
            SyntaxError::UnclosedParen {
                open_range: ByteRange::new(3, 4),
                eof: 8,
            },
        );
    }

    #[test]
    fn unexpected_close_paren() {
        assert_eq!(
            parse_err("a, b)"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(4, 5),
                found: ")".to_owned(),
                expected: COMMA_OR_EOF,
            },
        );
    }

    #[test]
    fn record_field_without_equals() {
        assert_eq!(
            parse_err("Record(x int64)"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(9, 14),
                found: "int64".to_owned(),
                expected: EQUALS,
            },
        );
    }

    #[test]
    fn non_integer_enumerant() {
        assert_eq!(
            parse_err("Enum(1, two)"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(8, 11),
                found: "two".to_owned(),
                expected: INTEGER,
            },
        );
    }

    #[test]
    fn var_needs_two_bounds() {
        assert_eq!(
            parse_err("Var(1)"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(5, 6),
                found: ")".to_owned(),
                expected: COMMA,
            },
        );
        assert_eq!(
            parse_err("Var(1, 2, 3)"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(8, 9),
                found: ",".to_owned(),
                expected: CLOSE_PAREN,
            },
        );
    }

    #[test]
    fn unknown_constructor() {
        assert_eq!(
            parse_err("3, Struct(x=int8)"),
            SyntaxError::UnknownConstructor {
                range: ByteRange::new(3, 9),
                name: "Struct".to_owned(),
            },
        );
    }

    #[test]
    fn empty_input_and_empty_groups() {
        assert_eq!(
            parse_err(""),
            SyntaxError::UnexpectedEof {
                pos: 0,
                expected: OPERAND,
            },
        );
        assert_eq!(
            parse_err("()"),
            SyntaxError::UnexpectedToken {
                range: ByteRange::new(1, 2),
                found: ")".to_owned(),
                expected: OPERAND,
            },
        );
        assert_eq!(
            parse_err("a,"),
            SyntaxError::UnexpectedEof {
                pos: 2,
                expected: OPERAND,
            },
        );
    }

    #[test]
    fn integer_overflow() {
        assert_eq!(
            parse_err("18446744073709551616"),
            SyntaxError::IntegerOverflow {
                range: ByteRange::new(0, 20),
            },
        );
    }

    #[test]
    fn lexer_errors_are_syntax_errors() {
        assert_eq!(
            parse_err("3, $"),
            SyntaxError::UnexpectedCharacter {
                range: ByteRange::new(3, 4),
            },
        );
    }

    #[test]
    fn deeply_nested_groups() {
        let depth = 10_000;
        let source = format!("{}a{}, b", "(".repeat(depth), ")".repeat(depth));
        let scope = Scope::new();
        let shape = parse_shape(&scope, &source).unwrap();

        assert_eq!(shape.operands.len(), 2);
        let mut term = &shape.operands[0];
        let mut seen = 0;
        while let Term::Paren(range, [inner]) = term {
            assert_eq!((range.end() - range.start()) as usize, 2 * (depth - seen) + 1);
            term = inner;
            seen += 1;
        }
        assert_eq!(seen, depth);
        assert!(matches!(term, Term::Name(_, name) if *name == "a"));
    }

    #[test]
    fn deeply_nested_groups_in_a_field() {
        let depth = 10_000;
        let source = format!("Record(x={}int8{})", "(".repeat(depth), ")".repeat(depth));
        let scope = Scope::new();
        let shape = parse_shape(&scope, &source).unwrap();

        assert!(matches!(shape.operands, [Term::Record(_, [_])]));
    }

    #[test]
    fn unclosed_nested_group() {
        assert_eq!(
            parse_err("((a), (b"),
            SyntaxError::UnclosedParen {
                open_range: ByteRange::new(6, 7),
                eof: 8,
            },
        );
    }

    #[test]
    fn records_nested_too_deeply() {
        let source = |depth: usize| {
            format!("{}int8{}", "Record(x=".repeat(depth), ")".repeat(depth))
        };

        let scope = Scope::new();
        assert!(parse_shape(&scope, &source(MAX_RECORD_DEPTH)).is_ok());

        let offset = MAX_RECORD_DEPTH * "Record(x=".len();
        assert_eq!(
            parse_err(&source(10_000)),
            SyntaxError::NestingTooDeep {
                range: ByteRange::new(offset as BytePos, (offset + "Record".len()) as BytePos),
                limit: MAX_RECORD_DEPTH,
            },
        );
    }

    #[test]
    fn keywords_as_field_labels() {
        let scope = Scope::new();
        let shape = parse_shape(&scope, "Record(Var=int8, Enum=Var(1, 2), Record=int16)").unwrap();

        match shape.operands {
            [Term::Record(_, [((_, a), _), ((_, b), Term::Var(..)), ((_, c), _)])] => {
                assert_eq!(*a, "Var");
                assert_eq!(*b, "Enum");
                assert_eq!(*c, "Record");
            }
            operands => panic!("unexpected operands: {operands:?}"),
        }
    }

    #[test]
    fn double_slash_is_not_a_comment() {
        assert_eq!(
            parse_err("a // b"),
            SyntaxError::UnexpectedCharacter {
                range: ByteRange::new(2, 3),
            },
        );
    }

    #[test]
    fn diagnostics_list_expected_tokens() {
        let diagnostic = parse_err("Record(x int64)").to_diagnostic(0);

        assert_eq!(diagnostic.message, "unexpected token `int64`");
        assert_eq!(diagnostic.notes, ["expected `=`"]);

        let diagnostic = parse_err("Var(1, 2, 3)").to_diagnostic(0);
        assert_eq!(diagnostic.notes, ["expected `)`"]);

        let diagnostic = parse_err("Enum(1 2)").to_diagnostic(0);
        assert_eq!(diagnostic.notes, ["expected `,` or `)`"]);
    }
}
