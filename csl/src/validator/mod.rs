pub mod error;

pub use error::ValidationError;

use tracing::debug;

use crate::operation::{Count, Operation, OperationKind, Run, Search, Write};
use crate::validator::error::Violation;

/// Check every operation in the tree and report all violations.
///
/// Per operation the order is fixed: required attributes, attribute values,
/// content. A TASKS block's own nesting error precedes its children's.
pub fn validate(operations: &[Operation]) -> Vec<ValidationError> {
    let mut validator = Validator::default();
    for operation in operations {
        validator.visit(operation, None);
    }
    debug!(errors = validator.errors.len(), "validation finished");
    validator.errors
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn visit(&mut self, operation: &Operation, parent_task_line: Option<usize>) {
        let violations = match operation {
            Operation::Write(write) => write_violations(write),
            Operation::Run(run) => run_violations(run),
            Operation::Search(search) => search_violations(search),
            Operation::Tasks(tasks) => {
                if parent_task_line.is_some() {
                    // Reported against the inner block alone.
                    self.errors.push(ValidationError {
                        line: tasks.line,
                        operation: OperationKind::Tasks,
                        message: Violation::NestedTasks.to_string(),
                        field: None,
                        parent_task_line: None,
                    });
                }
                for child in &tasks.operations {
                    self.visit(child, Some(tasks.line));
                }
                return;
            }
        };

        for violation in violations {
            self.errors.push(ValidationError {
                line: operation.line(),
                operation: operation.kind(),
                message: violation.to_string(),
                field: violation.field().map(str::to_string),
                parent_task_line,
            });
        }
    }
}

fn write_violations(write: &Write) -> Vec<Violation> {
    let mut violations = Vec::new();
    if write.file().is_none() {
        violations.push(Violation::MissingFile);
    }
    if write.append().is_some() && write.append_mode().is_none() {
        violations.push(Violation::InvalidAppend);
    }
    violations
}

fn run_violations(run: &Run) -> Vec<Violation> {
    if run.content.is_empty() {
        vec![Violation::EmptyRunContent]
    } else {
        Vec::new()
    }
}

fn search_violations(search: &Search) -> Vec<Violation> {
    let mut violations = Vec::new();
    if search.file().is_none() {
        violations.push(Violation::MissingFile);
    }
    if search.count().is_some_and(|count| Count::parse(count).is_none()) {
        violations.push(Violation::InvalidCount);
    }
    if search.pattern.is_empty() {
        violations.push(Violation::EmptyPattern);
    }
    if search.to.as_deref() == Some("") {
        violations.push(Violation::EmptyTo);
    }
    violations
}
