//! Elaboration of the surface language into the core language.
//!
//! This is where parenthesized groups are spliced into their enclosing operand
//! lists, names are resolved against the dtype registry, and the structured
//! operands are validated. Elaboration stops at the first error, so a partial
//! [`DataShape`] is never produced.

use fxhash::FxHashMap;

use crate::core::{prim, DataShape, Enum, Operand, Record, Var};
use crate::source::ByteRange;
use crate::surface::{Field, Shape, Term};
use crate::symbol::Symbol;

mod reporting;

pub use self::reporting::Message;

/// Validation settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    /// Reject `Var` operands whose lower bound exceeds their upper bound.
    pub validate_var_bounds: bool,
    /// Accept records that use the same label more than once.
    pub allow_duplicate_fields: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            validate_var_bounds: true,
            allow_duplicate_fields: false,
        }
    }
}

/// Elaboration context.
pub struct Context {
    options: Options,
}

impl Context {
    pub fn new(options: Options) -> Context {
        Context { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Elaborate a surface shape into a flat sequence of core operands.
    pub fn elab_shape(&self, shape: &Shape<'_>) -> Result<DataShape, Message> {
        let mut operands = Vec::with_capacity(shape.operands.len());
        self.splice_operands(&mut operands, shape.operands)?;
        Ok(DataShape::new(operands))
    }

    /// Append the elaborated `terms` to `operands`, splicing the contents of
    /// parenthesized groups in place of the groups themselves.
    fn splice_operands(&self, operands: &mut Vec<Operand>, terms: &[Term<'_>]) -> Result<(), Message> {
        // Unfinished groups, innermost last
        let mut groups = vec![terms.iter()];
        while let Some(terms) = groups.last_mut() {
            match terms.next() {
                None => {
                    groups.pop();
                }
                Some(Term::Paren(range, terms)) => {
                    tracing::trace!(%range, len = terms.len(), "splicing group");
                    groups.push(terms.iter());
                }
                Some(term) => operands.push(self.elab_operand(term)?),
            }
        }
        Ok(())
    }

    fn elab_operand(&self, term: &Term<'_>) -> Result<Operand, Message> {
        match term {
            Term::Name(_, name) => Ok(self.resolve_name(*name)),
            Term::Number(_, value) => Ok(Operand::Integer(*value)),
            Term::Record(range, fields) => self.elab_record(*range, fields),
            Term::Enum(_, values) => {
                let values = values.iter().map(|(_, value)| *value).collect();
                Ok(Operand::Enum(Enum::new(values)))
            }
            Term::Var(range, (_, lower), (_, upper)) => {
                if self.options.validate_var_bounds && lower > upper {
                    return Err(Message::InvertedVarBounds {
                        range: *range,
                        lower: *lower,
                        upper: *upper,
                    });
                }
                Ok(Operand::Var(Var::new(*lower, *upper)))
            }
            Term::Paren(range, terms) => {
                let mut operands = Vec::with_capacity(1);
                self.splice_operands(&mut operands, terms)?;
                match operands.len() {
                    1 => Ok(operands.remove(0)),
                    found_len => Err(Message::NonSingularFieldType {
                        range: *range,
                        found_len,
                    }),
                }
            }
        }
    }

    /// Resolve a name to a dtype, then to a named type. Anything else is a
    /// type variable.
    fn resolve_name(&self, name: Symbol) -> Operand {
        if let Some(dtype) = prim::lookup(name.resolve()) {
            tracing::trace!(%name, dtype = dtype.name(), "resolved dtype");
            return Operand::Dtype(dtype);
        }
        if let Some(r#type) = prim::lookup_named(name.resolve()) {
            tracing::trace!(%name, "resolved named type");
            return r#type.clone();
        }
        tracing::trace!(%name, "resolved type variable");
        Operand::TypeVar(name)
    }

    fn elab_record(&self, range: ByteRange, fields: &[Field<'_>]) -> Result<Operand, Message> {
        if !self.options.allow_duplicate_fields {
            check_duplicate_labels(range, fields)?;
        }

        let fields = fields
            .iter()
            .map(|((_, label), r#type)| Ok((*label, self.elab_operand(r#type)?)))
            .collect::<Result<_, Message>>()?;

        Ok(Operand::Record(Record::new(fields)))
    }
}

/// Fails if a label is used by more than one field, listing every repeated
/// occurrence.
fn check_duplicate_labels(range: ByteRange, fields: &[Field<'_>]) -> Result<(), Message> {
    let mut seen = FxHashMap::default();
    // Only allocates when duplicates are encountered
    let mut duplicate_labels = Vec::new();

    for ((label_range, label), _) in fields {
        if seen.insert(*label, *label_range).is_some() {
            duplicate_labels.push((*label_range, *label));
        }
    }

    match duplicate_labels.is_empty() {
        true => Ok(()),
        false => Err(Message::DuplicateFieldLabels {
            range,
            labels: duplicate_labels,
        }),
    }
}

#[cfg(test)]
mod tests {
    use scoped_arena::Scope;

    use super::*;
    use crate::core::prim::{FLOAT32, INT16, INT32, INT8};

    fn elab(options: Options, source: &str) -> Result<DataShape, Message> {
        let scope = Scope::new();
        let shape = Shape::parse(&scope, source).unwrap();
        Context::new(options).elab_shape(&shape)
    }

    #[test]
    fn groups_are_spliced() {
        let flat = elab(Options::default(), "a, b, c, d").unwrap();

        assert_eq!(elab(Options::default(), "a, (b, (c, (d)))").unwrap(), flat);
        assert_eq!(elab(Options::default(), "((a), b), ((c), d)").unwrap(), flat);
        assert_eq!(flat.len(), 4);
    }

    #[test]
    fn deeply_nested_groups_are_spliced() {
        let depth = 10_000;
        let (open, close) = ("(".repeat(depth), ")".repeat(depth));

        let source = format!("{open}a, {open}b{close}{close}, c");
        assert_eq!(elab(Options::default(), &source).unwrap(), elab(Options::default(), "a, b, c").unwrap());

        let source = format!("Record(x={open}int8{close})");
        let shape = elab(Options::default(), &source).unwrap();
        assert_eq!(shape[0].as_record().unwrap().field("x"), Ok(&Operand::Dtype(&INT8)));
    }

    #[test]
    fn names_resolve_to_dtypes_then_named_types_then_type_vars() {
        let shape = elab(Options::default(), "int, RGBA, N").unwrap();

        assert!(std::ptr::eq(shape[0].as_dtype().unwrap(), &INT32));
        assert_eq!(
            shape[1].as_record().unwrap().field("A"),
            Ok(&Operand::Dtype(&INT8))
        );
        assert_eq!(shape[2], Operand::TypeVar(Symbol::intern("N")));
    }

    #[test]
    fn record_field_groups_must_be_single_operands() {
        let shape = elab(Options::default(), "Record(x=(float), y=((int16)))").unwrap();
        let record = shape[0].as_record().unwrap();

        assert_eq!(record.field("x"), Ok(&Operand::Dtype(&FLOAT32)));
        assert_eq!(record.field("y"), Ok(&Operand::Dtype(&INT16)));

        assert_eq!(
            elab(Options::default(), "Record(x=(3, int8))"),
            Err(Message::NonSingularFieldType {
                range: ByteRange::new(9, 18),
                found_len: 2,
            }),
        );
    }

    #[test]
    fn inverted_var_bounds() {
        assert_eq!(
            elab(Options::default(), "Var(5, 2)"),
            Err(Message::InvertedVarBounds {
                range: ByteRange::new(0, 9),
                lower: 5,
                upper: 2,
            }),
        );

        let options = Options {
            validate_var_bounds: false,
            ..Options::default()
        };
        let shape = elab(options, "Var(5, 2)").unwrap();
        assert_eq!(shape[0], Operand::Var(Var::new(5, 2)));
    }

    #[test]
    fn duplicate_field_labels() {
        assert_eq!(
            elab(Options::default(), "Record(x=int8, y=int8, x=int16, x=int32)"),
            Err(Message::DuplicateFieldLabels {
                range: ByteRange::new(0, 40),
                labels: vec![
                    (ByteRange::new(23, 24), Symbol::intern("x")),
                    (ByteRange::new(32, 33), Symbol::intern("x")),
                ],
            }),
        );

        let options = Options {
            allow_duplicate_fields: true,
            ..Options::default()
        };
        let shape = elab(options, "Record(x=int8, x=int16)").unwrap();
        let record = shape[0].as_record().unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.field("x"), Ok(&Operand::Dtype(&INT8)));
    }

    #[test]
    fn errors_inside_records_are_reported() {
        assert!(matches!(
            elab(Options::default(), "Record(r=Record(a=Var(2, 1)))"),
            Err(Message::InvertedVarBounds { lower: 2, upper: 1, .. }),
        ));
    }
}
