//! Surface language.
//!
//! The surface syntax tree mirrors the input text, including parenthesized
//! groups, and records the source range of every node. It is allocated into a
//! [`Scope`] and is discarded once it has been [elaborated] into a core
//! [`DataShape`].
//!
//! [elaborated]: elaboration
//! [`DataShape`]: crate::core::DataShape

use scoped_arena::Scope;

use crate::source::ByteRange;
use crate::symbol::Symbol;

pub mod elaboration;
pub mod lexer;
mod parser;

pub use self::parser::SyntaxError;

/// A comma-separated list of operands.
#[derive(Debug, Clone)]
pub struct Shape<'arena> {
    pub range: ByteRange,
    pub operands: &'arena [Term<'arena>],
}

/// Record fields: a label, and the type of the field.
pub type Field<'arena> = ((ByteRange, Symbol), Term<'arena>);

/// Surface terms.
#[derive(Debug, Clone)]
pub enum Term<'arena> {
    /// Names, resolved during elaboration.
    Name(ByteRange, Symbol),
    /// Integer literals.
    Number(ByteRange, u64),
    /// Record types.
    Record(ByteRange, &'arena [Field<'arena>]),
    /// Enumeration types.
    Enum(ByteRange, &'arena [(ByteRange, u64)]),
    /// Bounded ranges.
    Var(ByteRange, (ByteRange, u64), (ByteRange, u64)),
    /// Parenthesized groups of operands.
    Paren(ByteRange, &'arena [Term<'arena>]),
}

impl<'arena> Term<'arena> {
    /// Get the source range of the term.
    pub fn range(&self) -> ByteRange {
        match self {
            Term::Name(range, _)
            | Term::Number(range, _)
            | Term::Record(range, _)
            | Term::Enum(range, _)
            | Term::Var(range, _, _)
            | Term::Paren(range, _) => *range,
        }
    }
}

impl<'arena> Shape<'arena> {
    /// Parse a shape from the `source` string, allocating nodes to the
    /// `scope`.
    pub fn parse(
        scope: &'arena Scope<'arena>,
        source: &str,
    ) -> Result<Shape<'arena>, SyntaxError> {
        parser::parse_shape(scope, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_drop() {
        assert!(!std::mem::needs_drop::<Term<'_>>());
        assert!(!std::mem::needs_drop::<Field<'_>>());
    }
}
