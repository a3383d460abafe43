//! Core language.
//!
//! A [`DataShape`] is a flat sequence of [`Operand`]s. The leading operands
//! usually describe dimensions, and the final operand the element type, or
//! _measure_, of the array. Shapes are produced by [elaborating] the surface
//! language, and are immutable once constructed.
//!
//! [elaborating]: crate::surface::elaboration

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use crate::symbol::Symbol;

pub mod pretty;
pub mod prim;

pub use self::prim::{Dtype, DtypeKind};

/// Array data shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataShape {
    operands: Vec<Operand>,
}

impl DataShape {
    /// Construct a shape from a sequence of operands.
    pub fn new(operands: Vec<Operand>) -> DataShape {
        DataShape { operands }
    }

    /// Parse a shape from the datashape notation.
    pub fn parse(source: &str) -> Result<DataShape, crate::Error> {
        crate::parse(source)
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// The dimensions of the shape: every operand except the last.
    pub fn dims(&self) -> &[Operand] {
        match self.operands.split_last() {
            Some((_, dims)) => dims,
            None => &[],
        }
    }

    /// The element type of the shape: the last operand.
    pub fn measure(&self) -> Option<&Operand> {
        self.operands.last()
    }

    /// The type variables that appear in the shape, in order of appearance.
    /// Record fields are searched as well.
    pub fn free_vars(&self) -> Vec<Symbol> {
        let mut vars = Vec::new();
        for operand in &self.operands {
            operand.collect_type_vars(&mut vars);
        }
        vars
    }

    /// The size in bytes of a single element of the shape.
    pub fn itemsize(&self) -> Option<usize> {
        self.measure()?.itemsize()
    }
}

impl Deref for DataShape {
    type Target = [Operand];

    fn deref(&self) -> &[Operand] {
        &self.operands
    }
}

impl<'a> IntoIterator for &'a DataShape {
    type Item = &'a Operand;
    type IntoIter = std::slice::Iter<'a, Operand>;

    fn into_iter(self) -> Self::IntoIter {
        self.operands.iter()
    }
}

impl IntoIterator for DataShape {
    type Item = Operand;
    type IntoIter = std::vec::IntoIter<Operand>;

    fn into_iter(self) -> Self::IntoIter {
        self.operands.into_iter()
    }
}

impl std::str::FromStr for DataShape {
    type Err = crate::Error;

    fn from_str(source: &str) -> Result<DataShape, crate::Error> {
        crate::parse(source)
    }
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = scoped_arena::Scope::new();
        let context = pretty::Context::new(&scope);
        let doc = context.shape(self).into_doc();
        write!(f, "{}", doc.pretty(usize::MAX))
    }
}

/// Elements of a [`DataShape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Fixed dimension sizes, or fixed enumerants.
    Integer(u64),
    /// Symbolic placeholders for dimensions or types.
    TypeVar(Symbol),
    /// Record types.
    Record(Record),
    /// Enumeration types.
    Enum(Enum),
    /// Bounded ranges.
    Var(Var),
    /// Built-in dtypes, compared by identity.
    Dtype(&'static Dtype),
}

impl Operand {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Operand::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_type_var(&self) -> Option<Symbol> {
        match self {
            Operand::TypeVar(symbol) => Some(*symbol),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Operand::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Enum> {
        match self {
            Operand::Enum(r#enum) => Some(r#enum),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Operand::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_dtype(&self) -> Option<&'static Dtype> {
        match self {
            Operand::Dtype(dtype) => Some(*dtype),
            _ => None,
        }
    }

    /// The text of a bare integer or type variable.
    ///
    /// Integers are given in normalized decimal form, so the operand parsed
    /// from `007` has the symbol `7`. Type variables give their name as
    /// written.
    pub fn symbol(&self) -> Option<Cow<'static, str>> {
        match self {
            Operand::Integer(value) => Some(Cow::Owned(value.to_string())),
            Operand::TypeVar(symbol) => Some(Cow::Borrowed(symbol.resolve())),
            Operand::Record(_) | Operand::Enum(_) | Operand::Var(_) | Operand::Dtype(_) => None,
        }
    }

    /// Returns `true` if the operand can stand for the size of a dimension.
    pub fn is_dimension(&self) -> bool {
        match self {
            Operand::Integer(_) | Operand::TypeVar(_) | Operand::Var(_) => true,
            Operand::Record(_) | Operand::Enum(_) | Operand::Dtype(_) => false,
        }
    }

    /// The packed size in bytes of values of this operand, if it describes
    /// element data of a known width.
    pub fn itemsize(&self) -> Option<usize> {
        match self {
            Operand::Dtype(dtype) => Some(dtype.size()),
            Operand::Record(record) => record
                .fields()
                .iter()
                .try_fold(0, |size, (_, r#type)| Some(size + r#type.itemsize()?)),
            Operand::Integer(_) | Operand::TypeVar(_) | Operand::Enum(_) | Operand::Var(_) => None,
        }
    }

    fn collect_type_vars(&self, vars: &mut Vec<Symbol>) {
        match self {
            Operand::TypeVar(symbol) => vars.push(*symbol),
            Operand::Record(record) => {
                for (_, r#type) in record.fields() {
                    r#type.collect_type_vars(vars);
                }
            }
            Operand::Integer(_) | Operand::Enum(_) | Operand::Var(_) | Operand::Dtype(_) => {}
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = scoped_arena::Scope::new();
        let context = pretty::Context::new(&scope);
        let doc = context.operand(self).into_doc();
        write!(f, "{}", doc.pretty(usize::MAX))
    }
}

/// Record types, with fields kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    fields: Vec<(Symbol, Operand)>,
}

impl Record {
    pub fn new(fields: Vec<(Symbol, Operand)>) -> Record {
        Record { fields }
    }

    pub fn fields(&self) -> &[(Symbol, Operand)] {
        &self.fields
    }

    pub fn labels(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.fields.iter().map(|(label, _)| *label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Lookup the type of a field. If a label occurs more than once, the
    /// first occurrence is returned.
    pub fn field(&self, name: &str) -> Result<&Operand, FieldNotFound> {
        self.fields
            .iter()
            .find(|(label, _)| label.resolve() == name)
            .map(|(_, r#type)| r#type)
            .ok_or_else(|| FieldNotFound {
                name: name.to_owned(),
                suggestion: self.suggest_label(name),
            })
    }

    fn suggest_label(&self, name: &str) -> Option<Symbol> {
        const MAX_DISTANCE: usize = 2;

        self.labels()
            .map(|label| (levenshtein::levenshtein(name, label.resolve()), label))
            .filter(|(distance, _)| *distance <= MAX_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, label)| label)
    }
}

/// Returned by [`Record::field`] when the record has no field with the
/// requested name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no field named `{name}` in record")]
pub struct FieldNotFound {
    pub name: String,
    /// A label of the record that is spelled similarly to `name`.
    pub suggestion: Option<Symbol>,
}

/// Enumeration types over a finite set of integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Enum {
    values: Vec<u64>,
}

impl Enum {
    pub fn new(values: Vec<u64>) -> Enum {
        Enum { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn contains(&self, value: u64) -> bool {
        self.values.contains(&value)
    }
}

/// Bounded ranges, `lower..=upper`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub lower: u64,
    pub upper: u64,
}

impl Var {
    pub fn new(lower: u64, upper: u64) -> Var {
        Var { lower, upper }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.lower <= value && value <= self.upper
    }
}
