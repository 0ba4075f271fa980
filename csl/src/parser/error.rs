use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::operation::OperationKind;
use crate::parser::attributes::AttributeError;
use crate::parser::state::State;
use crate::source::line_range;

/// A fatal syntax error. Parsing stops at the first one.
///
/// Displays as `Line <n>: <reason>`; downstream tools match on that text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}: {kind}")]
pub struct SyntaxError {
    /// 1-based source line.
    pub line: usize,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("Malformed marker")]
    MalformedMarker,
    #[error("Content not allowed on marker line")]
    ContentOnMarkerLine,
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("{marker} marker not valid in {state} operation")]
    InvalidMarker { marker: String, state: State },
    #[error("{marker} marker without active operation")]
    NoActiveOperation { marker: String },
    #[error("END marker cannot have attributes")]
    EndWithAttributes,
    #[error("TASKS cannot be nested")]
    NestedTasks,
    #[error("Unterminated {0} operation")]
    Unterminated(OperationKind),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
}

impl SyntaxError {
    pub fn new(line: usize, kind: impl Into<SyntaxErrorKind>) -> Self {
        SyntaxError {
            line,
            kind: kind.into(),
        }
    }

    /// The reason without the `Line <n>: ` prefix.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }

    /// Convert to a codespan-reporting Diagnostic labelling the offending line.
    pub fn to_diagnostic(&self, file_id: usize, source: &str) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.reason())
            .with_labels(vec![Label::primary(file_id, line_range(source, self.line))])
    }
}
