//! Interned identifiers.
//!
//! Type variables and record labels are stored as [`Symbol`]s, which are
//! cheap to copy and compare. The interner is shared by the whole process and
//! supports concurrent interning from parallel parses.
//!
//! Interned strings are never freed. Every distinct type variable or label
//! that is parsed stays in memory until the process exits, so parsing
//! untrusted input with unbounded vocabularies grows memory use.

use std::fmt;

use lasso::ThreadedRodeo;
use once_cell::sync::Lazy;

static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(|| ThreadedRodeo::new());

/// An interned string.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(lasso::Spur);

impl Symbol {
    pub fn intern(sym: impl AsRef<str>) -> Self {
        Self(INTERNER.get_or_intern(sym))
    }

    pub fn intern_static(sym: &'static str) -> Self {
        Self(INTERNER.get_or_intern_static(sym))
    }

    /// Look up a previously interned string without interning it.
    pub fn get(sym: impl AsRef<str>) -> Option<Self> {
        INTERNER.get(sym).map(Self)
    }

    pub fn resolve(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.resolve()
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resolve())
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.resolve() == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.resolve() == *other
    }
}
