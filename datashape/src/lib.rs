//! Parsing of datashape type descriptions.
//!
//! A datashape describes the dimensions and element type of an array, for
//! example `N, M, 800, 600, RGBA` or `6, Record(x=int32, y=float64)`. Parsing
//! produces a flat [`DataShape`]: nested parenthesized groups are spliced into
//! their enclosing operand list, and names are resolved to built-in
//! [`Dtype`]s, named types, or type variables.
//!
//! ```
//! let shape = datashape::parse("N, (3, (int16, int8))").unwrap();
//!
//! assert_eq!(shape.len(), 4);
//! assert_eq!(shape.to_string(), "N, 3, int16, int8");
//! ```
//!
//! Type variable names and record labels are interned into a process-wide
//! table that is never cleared. Long-running processes that parse shapes
//! with ever-new names keep every one of those names in memory.

// Supporting modules
pub mod source;
mod symbol;

// Intermediate languages
pub mod core;
pub mod surface;

// Top level API
pub mod driver;
pub mod reporting;

pub use crate::core::{DataShape, Dtype, DtypeKind, Enum, FieldNotFound, Operand, Record, Var};
pub use crate::driver::{Driver, Status};
pub use crate::reporting::Error;
pub use crate::surface::elaboration::Options;
pub use crate::symbol::Symbol;

/// Parse a datashape, validating `Var` bounds and record labels.
pub fn parse(source: &str) -> Result<DataShape, Error> {
    parse_with_options(source, Options::default())
}

/// Parse a datashape with the given validation settings.
///
/// # Panics
///
/// If `source` is longer than [`source::MAX_SOURCE_LEN`].
pub fn parse_with_options(source: &str, options: Options) -> Result<DataShape, Error> {
    tracing::debug!(len = source.len(), "parsing datashape");

    let scope = scoped_arena::Scope::new();
    let shape = surface::Shape::parse(&scope, source)?;
    let context = surface::elaboration::Context::new(options);
    let shape = context.elab_shape(&shape)?;

    tracing::debug!(operands = shape.len(), "parsed datashape");
    Ok(shape)
}
