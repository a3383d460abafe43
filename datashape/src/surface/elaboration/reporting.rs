use codespan_reporting::diagnostic::{Diagnostic, Label};
use itertools::Itertools;

use crate::source::ByteRange;
use crate::symbol::Symbol;

/// Elaboration diagnostic messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Message {
    /// The lower bound of a `Var` was greater than its upper bound.
    #[error("lower bound of range is greater than its upper bound")]
    InvertedVarBounds {
        range: ByteRange,
        lower: u64,
        upper: u64,
    },
    #[error("duplicate labels found in record")]
    DuplicateFieldLabels {
        range: ByteRange,
        labels: Vec<(ByteRange, Symbol)>,
    },
    /// A parenthesized record field type did not contain exactly one operand
    /// once spliced.
    #[error("record field type must be a single operand")]
    NonSingularFieldType { range: ByteRange, found_len: usize },
}

impl Message {
    pub fn range(&self) -> ByteRange {
        match self {
            Message::InvertedVarBounds { range, .. }
            | Message::DuplicateFieldLabels { range, .. }
            | Message::NonSingularFieldType { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let primary_label = |range: &ByteRange| Label::primary(file_id, *range);
        let secondary_label = |range: &ByteRange| Label::secondary(file_id, *range);

        match self {
            Message::InvertedVarBounds {
                range,
                lower,
                upper,
            } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![primary_label(range).with_message("empty range")])
                .with_notes(vec![format!(
                    "expected a lower bound of at most {upper}, found {lower}"
                )]),
            Message::DuplicateFieldLabels { range, labels } => {
                let diagnostic_labels = (labels.iter())
                    .map(|(range, _)| primary_label(range).with_message("duplicate field"))
                    .chain(std::iter::once(
                        secondary_label(range).with_message("the record type"),
                    ))
                    .collect();

                Diagnostic::error()
                    .with_message(self.to_string())
                    .with_labels(diagnostic_labels)
                    .with_notes(vec![format!(
                        "duplicate fields {}",
                        (labels.iter())
                            .map(|(_, label)| label)
                            .unique()
                            .format_with(", ", |label, f| f(&format_args!("`{label}`")))
                    )])
            }
            Message::NonSingularFieldType { range, found_len } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![
                    primary_label(range).with_message(format!("found {found_len} operands"))
                ])
                .with_notes(vec![
                    "parenthesized groups are only spliced into operand lists".to_owned(),
                ]),
        }
    }
}
