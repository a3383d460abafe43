//! Errors produced when parsing datashapes.
//!
//! These can be converted to [`Diagnostic`]s in order to present them to the
//! user.
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

use codespan_reporting::diagnostic::Diagnostic;

use crate::source::ByteRange;
use crate::surface::elaboration::Message;
use crate::surface::SyntaxError;

/// Failures from either stage of parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input was not well-formed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// The input was well-formed, but did not describe a valid shape.
    #[error(transparent)]
    Elab(#[from] Message),
}

impl Error {
    /// The source range that caused the error.
    pub fn range(&self) -> ByteRange {
        match self {
            Error::Syntax(error) => error.range(),
            Error::Elab(message) => message.range(),
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        match self {
            Error::Syntax(error) => error.to_diagnostic(file_id),
            Error::Elab(message) => message.to_diagnostic(file_id),
        }
    }
}
