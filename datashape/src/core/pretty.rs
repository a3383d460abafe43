//! Pretty printing of shapes back to the datashape notation.
//!
//! Printing a shape and parsing the result produces an equal shape.

use pretty::{Doc, DocAllocator, DocBuilder, DocPtr, RefDoc};
use scoped_arena::Scope;

use crate::core::{DataShape, Enum, Operand, Record, Var};

pub struct Context<'arena> {
    scope: &'arena Scope<'arena>,
}

impl<'arena> Context<'arena> {
    pub fn new(scope: &'arena Scope<'arena>) -> Context<'arena> {
        Context { scope }
    }

    pub fn shape(&'arena self, shape: &DataShape) -> DocBuilder<'arena, Self> {
        self.operands(shape.operands())
    }

    pub fn operand(&'arena self, operand: &Operand) -> DocBuilder<'arena, Self> {
        match operand {
            Operand::Integer(value) => self.text(value.to_string()),
            Operand::TypeVar(symbol) => self.text(symbol.resolve()),
            Operand::Record(record) => self.record(record),
            Operand::Enum(r#enum) => self.r#enum(r#enum),
            Operand::Var(var) => self.var(var),
            Operand::Dtype(dtype) => self.text(dtype.name()),
        }
    }

    fn operands(&'arena self, operands: &[Operand]) -> DocBuilder<'arena, Self> {
        self.comma_sep(operands.iter().map(|operand| self.operand(operand)))
    }

    fn record(&'arena self, record: &Record) -> DocBuilder<'arena, Self> {
        self.call(
            "Record",
            record.fields().iter().map(|(label, r#type)| {
                self.concat([
                    self.text(label.resolve()),
                    self.text("="),
                    self.operand(r#type),
                ])
            }),
        )
    }

    fn r#enum(&'arena self, r#enum: &Enum) -> DocBuilder<'arena, Self> {
        self.call(
            "Enum",
            r#enum.values().iter().map(|value| self.text(value.to_string())),
        )
    }

    fn var(&'arena self, var: &Var) -> DocBuilder<'arena, Self> {
        self.call(
            "Var",
            [
                self.text(var.lower.to_string()),
                self.text(var.upper.to_string()),
            ],
        )
    }

    fn call(
        &'arena self,
        name: &'static str,
        args: impl IntoIterator<Item = DocBuilder<'arena, Self>>,
    ) -> DocBuilder<'arena, Self> {
        self.concat([
            self.text(name),
            self.text("("),
            self.comma_sep(args),
            self.text(")"),
        ])
    }

    fn comma_sep(
        &'arena self,
        docs: impl IntoIterator<Item = DocBuilder<'arena, Self>>,
    ) -> DocBuilder<'arena, Self> {
        self.intersperse(docs, self.concat([self.text(","), self.space()]))
    }
}

impl<'arena, A: 'arena> DocAllocator<'arena, A> for Context<'arena> {
    type Doc = RefDoc<'arena, A>;

    #[inline]
    fn alloc(&'arena self, doc: Doc<'arena, Self::Doc, A>) -> Self::Doc {
        RefDoc(match doc {
            // Return 'static references for common variants to avoid some allocations
            Doc::Nil => &Doc::Nil,
            Doc::Hardline => &Doc::Hardline,
            Doc::Fail => &Doc::Fail,
            // space()
            Doc::BorrowedText(" ") => &Doc::BorrowedText(" "),

            // Language tokens
            Doc::BorrowedText("Record") => &Doc::BorrowedText("Record"),
            Doc::BorrowedText("Enum") => &Doc::BorrowedText("Enum"),
            Doc::BorrowedText("Var") => &Doc::BorrowedText("Var"),
            Doc::BorrowedText(",") => &Doc::BorrowedText(","),
            Doc::BorrowedText("=") => &Doc::BorrowedText("="),
            Doc::BorrowedText("(") => &Doc::BorrowedText("("),
            Doc::BorrowedText(")") => &Doc::BorrowedText(")"),

            _ => self.scope.to_scope(doc),
        })
    }

    fn alloc_column_fn(
        &'arena self,
        f: impl 'arena + Fn(usize) -> Self::Doc,
    ) -> <Self::Doc as DocPtr<'arena, A>>::ColumnFn {
        self.scope.to_scope(f)
    }

    fn alloc_width_fn(
        &'arena self,
        f: impl 'arena + Fn(isize) -> Self::Doc,
    ) -> <Self::Doc as DocPtr<'arena, A>>::WidthFn {
        self.scope.to_scope(f)
    }
}
