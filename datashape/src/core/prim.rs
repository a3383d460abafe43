//! Built-in dtypes.
//!
//! Every dtype is a `static`, so a lookup by name always returns the same
//! reference. Two dtype operands are equal only if they point at the same
//! registry entry.
//!
//! The name table, along with the kind and byte width of each entry, is relied
//! upon by code that maps shapes onto native buffers. Entries must not be
//! renamed or resized.

use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::{Operand, Record};
use crate::symbol::Symbol;

/// The representation of the values of a dtype.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DtypeKind {
    /// Booleans, stored as a single byte.
    Bool,
    /// Signed, two's complement integers.
    Int,
    /// Unsigned integers.
    UInt,
    /// IEEE-754 floating point numbers.
    Float,
    /// Pairs of IEEE-754 floating point numbers.
    Complex,
    /// Pointers to objects owned by the host environment.
    Object,
}

/// Fixed-width scalar element types.
pub struct Dtype {
    name: &'static str,
    kind: DtypeKind,
    size: usize,
}

impl Dtype {
    /// The canonical name of the dtype.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> DtypeKind {
        self.kind
    }

    /// The width of the dtype in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl PartialEq for Dtype {
    fn eq(&self, other: &Dtype) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Dtype {}

impl Hash for Dtype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dtype({})", self.name)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! def_dtypes {
    ($($(#[$dtype_attr:meta])* $DTYPE:ident => ($dtype_name:literal, $Kind:ident, $size:expr)),* $(,)?) => {
        $(
            $(#[$dtype_attr])*
            pub static $DTYPE: Dtype = Dtype {
                name: $dtype_name,
                kind: DtypeKind::$Kind,
                size: $size,
            };
        )*

        static DTYPES: &[&Dtype] = &[$(&$DTYPE),*];
    };
}

def_dtypes! {
    /// Booleans.
    BOOL => ("bool", Bool, 1),

    /// Signed, 8-bit integers.
    INT8 => ("int8", Int, 1),
    /// Signed, 16-bit integers.
    INT16 => ("int16", Int, 2),
    /// Signed, 32-bit integers.
    INT32 => ("int32", Int, 4),
    /// Signed, 64-bit integers.
    INT64 => ("int64", Int, 8),

    /// Unsigned, 8-bit integers.
    UINT8 => ("uint8", UInt, 1),
    /// Unsigned, 16-bit integers.
    UINT16 => ("uint16", UInt, 2),
    /// Unsigned, 32-bit integers.
    UINT32 => ("uint32", UInt, 4),
    /// Unsigned, 64-bit integers.
    UINT64 => ("uint64", UInt, 8),

    /// 32-bit, IEEE-754 floating point numbers.
    FLOAT32 => ("float32", Float, 4),
    /// 64-bit, IEEE-754 floating point numbers.
    FLOAT64 => ("float64", Float, 8),

    /// Complex numbers made of two `float32`s.
    COMPLEX64 => ("complex64", Complex, 8),
    /// Complex numbers made of two `float64`s.
    COMPLEX128 => ("complex128", Complex, 16),

    /// Opaque references to host objects.
    OBJECT => ("object", Object, std::mem::size_of::<usize>()),
}

/// Alternative spellings of the built-in dtypes.
static ALIASES: &[(&str, &Dtype)] = &[
    ("int", &INT32),
    ("float", &FLOAT32),
    ("double", &FLOAT64),
    ("pyobject", &OBJECT),
    ("PyObject", &OBJECT),
];

static REGISTRY: Lazy<FxHashMap<&'static str, &'static Dtype>> = Lazy::new(|| {
    let canonical = DTYPES.iter().map(|dtype| (dtype.name(), *dtype));
    canonical.chain(ALIASES.iter().copied()).collect()
});

/// Composite types that can be referred to by name.
static NAMED_TYPES: Lazy<FxHashMap<&'static str, Operand>> = Lazy::new(|| {
    let mut types = FxHashMap::default();

    types.insert(
        "RGBA",
        Operand::Record(Record::new(vec![
            (Symbol::intern_static("R"), Operand::Dtype(&INT16)),
            (Symbol::intern_static("G"), Operand::Dtype(&INT16)),
            (Symbol::intern_static("B"), Operand::Dtype(&INT16)),
            (Symbol::intern_static("A"), Operand::Dtype(&INT8)),
        ])),
    );

    types
});

/// Lookup a built-in dtype by name, including aliases.
pub fn lookup(name: &str) -> Option<&'static Dtype> {
    REGISTRY.get(name).copied()
}

/// Lookup a named composite type.
pub fn lookup_named(name: &str) -> Option<&'static Operand> {
    NAMED_TYPES.get(name)
}

/// The canonical dtypes, in declaration order.
pub fn dtypes() -> impl Iterator<Item = &'static Dtype> {
    DTYPES.iter().copied()
}

/// Every name that resolves to a dtype or a named type, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names = (REGISTRY.keys().copied())
        .chain(NAMED_TYPES.keys().copied())
        .collect::<Vec<_>>();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_return_the_same_static() {
        let first = lookup("int64").unwrap();
        let second = lookup("int64").unwrap();

        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first, &INT64));
    }

    #[test]
    fn aliases_resolve_to_canonical_dtypes() {
        assert!(std::ptr::eq(lookup("float").unwrap(), &FLOAT32));
        assert!(std::ptr::eq(lookup("double").unwrap(), &FLOAT64));
        assert!(std::ptr::eq(lookup("int").unwrap(), &INT32));
        assert!(std::ptr::eq(lookup("pyobject").unwrap(), &OBJECT));
        assert!(std::ptr::eq(lookup("PyObject").unwrap(), &OBJECT));
        assert!(std::ptr::eq(lookup("object").unwrap(), &OBJECT));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("Int64").is_none());
        assert!(lookup("INT64").is_none());
        assert!(lookup("str").is_none());
    }

    #[test]
    fn dtypes_with_the_same_layout_are_distinct() {
        assert_ne!(INT32, UINT32);
        assert_ne!(FLOAT64, COMPLEX64);
        assert_eq!(INT32, INT32);
    }

    #[test]
    fn byte_widths() {
        let widths = dtypes()
            .map(|dtype| (dtype.name(), dtype.kind(), dtype.size()))
            .collect::<Vec<_>>();

        assert_eq!(
            widths,
            [
                ("bool", DtypeKind::Bool, 1),
                ("int8", DtypeKind::Int, 1),
                ("int16", DtypeKind::Int, 2),
                ("int32", DtypeKind::Int, 4),
                ("int64", DtypeKind::Int, 8),
                ("uint8", DtypeKind::UInt, 1),
                ("uint16", DtypeKind::UInt, 2),
                ("uint32", DtypeKind::UInt, 4),
                ("uint64", DtypeKind::UInt, 8),
                ("float32", DtypeKind::Float, 4),
                ("float64", DtypeKind::Float, 8),
                ("complex64", DtypeKind::Complex, 8),
                ("complex128", DtypeKind::Complex, 16),
                ("object", DtypeKind::Object, std::mem::size_of::<usize>()),
            ]
        );
    }

    #[test]
    fn named_types() {
        let rgba = lookup_named("RGBA").and_then(Operand::as_record).unwrap();

        assert_eq!(rgba.labels().collect::<Vec<_>>(), ["R", "G", "B", "A"]);
        assert!(lookup_named("rgba").is_none());
        assert!(lookup("RGBA").is_none());
    }

    #[test]
    fn names_are_sorted_and_complete() {
        let names = names();

        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(names.contains(&"double"));
        assert!(names.contains(&"RGBA"));
        assert_eq!(names.len(), DTYPES.len() + ALIASES.len() + 1);
    }
}
