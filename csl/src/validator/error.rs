use codespan_reporting::diagnostic::{Diagnostic, Label};
use serde::Serialize;
use thiserror::Error;

use crate::operation::OperationKind;
use crate::source::line_range;

/// A semantic problem with one operation. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Line of the offending operation's opening marker.
    pub line: usize,
    pub operation: OperationKind,
    pub message: String,
    /// The attribute at fault, for value-domain errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Opening line of the enclosing TASKS block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_line: Option<usize>,
}

impl ValidationError {
    /// Convert to a codespan-reporting Diagnostic labelling the operation's
    /// opening line.
    pub fn to_diagnostic(&self, file_id: usize, source: &str) -> Diagnostic<usize> {
        let mut notes = Vec::new();
        if let Some(parent) = self.parent_task_line {
            notes.push(format!("inside the TASKS block opened on line {}", parent));
        }
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![
                Label::primary(file_id, line_range(source, self.line))
                    .with_message(format!("in this {} operation", self.operation)),
            ])
            .with_notes(notes)
    }
}

/// The rules the validator enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum Violation {
    #[error("Missing required attribute 'file'")]
    MissingFile,
    #[error("Invalid value for 'count': must be positive integer or 'all'")]
    InvalidCount,
    #[error("Invalid value for 'append': must be 'true' or 'false'")]
    InvalidAppend,
    #[error("Empty content not allowed for RUN operation")]
    EmptyRunContent,
    #[error("Empty search pattern not allowed")]
    EmptyPattern,
    #[error("Empty TO pattern not allowed")]
    EmptyTo,
    #[error("TASKS cannot contain other TASKS operations")]
    NestedTasks,
}

impl Violation {
    pub(crate) fn field(self) -> Option<&'static str> {
        match self {
            Violation::InvalidCount => Some("count"),
            Violation::InvalidAppend => Some("append"),
            _ => None,
        }
    }
}
