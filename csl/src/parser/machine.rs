use tracing::{debug, trace};

use crate::operation::{Attributes, Operation, OperationKind, Run, Search, Tasks, Write};
use crate::parser::attributes::parse_attributes;
use crate::parser::delimiter::{MarkerMatch, MarkerPattern};
use crate::parser::error::{SyntaxError, SyntaxErrorKind};
use crate::parser::marker::{LineClass, classify};
use crate::parser::state::{END, REPLACE, State, TO};
use crate::source::line_ranges;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the line-driven state machine over `source`.
pub fn parse_operations(
    source: &str,
    pattern: &MarkerPattern,
) -> Result<Vec<Operation>, SyntaxError> {
    let mut state = ParseState::new(pattern);
    for (index, range) in line_ranges(source).into_iter().enumerate() {
        state.process_line(index + 1, &source[range])?;
    }
    state.finalize()
}

// ---------------------------------------------------------------------------
// Open operations
// ---------------------------------------------------------------------------

/// The operations currently open: at most one TASKS group and one nested
/// operation collecting content. A second group has no slot to live in.
#[derive(Default)]
struct OpenOperations<'s> {
    group: Option<GroupBuilder>,
    current: Option<OperationBuilder<'s>>,
}

impl OpenOperations<'_> {
    fn state(&self) -> State {
        match (&self.current, &self.group) {
            (Some(op), _) => op.state(),
            (None, Some(_)) => State::Tasks,
            (None, None) => State::Idle,
        }
    }
}

struct GroupBuilder {
    line: usize,
    attributes: Attributes,
    operations: Vec<Operation>,
}

impl GroupBuilder {
    fn into_operation(self) -> Operation {
        Operation::Tasks(Tasks {
            line: self.line,
            attributes: self.attributes,
            operations: self.operations,
        })
    }
}

struct OperationBuilder<'s> {
    line: usize,
    attributes: Attributes,
    body: Body<'s>,
}

enum Body<'s> {
    Write(Vec<&'s str>),
    Run(Vec<&'s str>),
    Search {
        section: SearchSection,
        pattern: Vec<&'s str>,
        to: Option<Vec<&'s str>>,
        replacement: Vec<&'s str>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SearchSection {
    Pattern,
    To,
    Replacement,
}

impl<'s> OperationBuilder<'s> {
    fn kind(&self) -> OperationKind {
        match self.body {
            Body::Write(_) => OperationKind::Write,
            Body::Run(_) => OperationKind::Run,
            Body::Search { .. } => OperationKind::Search,
        }
    }

    fn state(&self) -> State {
        match &self.body {
            Body::Write(_) => State::Write,
            Body::Run(_) => State::Run,
            Body::Search { section, .. } => match section {
                SearchSection::Pattern => State::SearchPattern,
                SearchSection::To => State::SearchTo,
                SearchSection::Replacement => State::SearchReplacement,
            },
        }
    }

    fn push_line(&mut self, line: &'s str) {
        match &mut self.body {
            Body::Write(content) | Body::Run(content) => content.push(line),
            Body::Search {
                section,
                pattern,
                to,
                replacement,
            } => match section {
                SearchSection::Pattern => pattern.push(line),
                SearchSection::To => to.get_or_insert_with(Vec::new).push(line),
                SearchSection::Replacement => replacement.push(line),
            },
        }
    }

    fn enter(&mut self, next: SearchSection) {
        if let Body::Search { section, to, .. } = &mut self.body {
            if next == SearchSection::To {
                to.get_or_insert_with(Vec::new);
            }
            *section = next;
        }
    }

    fn into_operation(self) -> Operation {
        let OperationBuilder {
            line,
            attributes,
            body,
        } = self;
        match body {
            Body::Write(content) => Operation::Write(Write {
                line,
                attributes,
                content: content.join("\n"),
            }),
            Body::Run(content) => Operation::Run(Run {
                line,
                attributes,
                content: content.join("\n"),
            }),
            Body::Search {
                pattern,
                to,
                replacement,
                ..
            } => Operation::Search(Search {
                line,
                attributes,
                pattern: pattern.join("\n"),
                to: to.map(|lines| lines.join("\n")),
                replacement: replacement.join("\n"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'s, 'p> {
    pattern: &'p MarkerPattern,
    open: OpenOperations<'s>,
    /// Completed top-level operations.
    operations: Vec<Operation>,
}

impl<'s, 'p> ParseState<'s, 'p> {
    fn new(pattern: &'p MarkerPattern) -> Self {
        ParseState {
            pattern,
            open: OpenOperations::default(),
            operations: Vec::new(),
        }
    }

    fn process_line(&mut self, number: usize, line: &'s str) -> Result<(), SyntaxError> {
        let state = self.open.state();
        let class = classify(self.pattern, line, state)
            .map_err(|kind| SyntaxError::new(number, kind))?;

        match class {
            LineClass::Content => {
                // Outside an operation there is nowhere to put content.
                if let Some(op) = self.open.current.as_mut() {
                    op.push_line(line);
                }
                Ok(())
            }
            LineClass::Marker(marker) => {
                trace!(line = number, marker = marker.name, %state, "marker");
                self.process_marker(number, marker, state)
                    .map_err(|kind| SyntaxError::new(number, kind))
            }
        }
    }

    fn process_marker(
        &mut self,
        number: usize,
        marker: MarkerMatch<'s>,
        state: State,
    ) -> Result<(), SyntaxErrorKind> {
        match marker.name {
            END => self.close(marker.attributes, state),
            TO => self.enter_section(TO, SearchSection::To, state),
            REPLACE => self.enter_section(REPLACE, SearchSection::Replacement, state),
            name => match OperationKind::from_marker_name(name) {
                Some(kind) => self.open(number, kind, marker.attributes, state),
                None => Err(SyntaxErrorKind::UnknownOperation(name.to_string())),
            },
        }
    }

    fn open(
        &mut self,
        number: usize,
        kind: OperationKind,
        attribute_text: &str,
        state: State,
    ) -> Result<(), SyntaxErrorKind> {
        if kind == OperationKind::Tasks && self.open.group.is_some() {
            return Err(SyntaxErrorKind::NestedTasks);
        }
        if state.collects_content() {
            return Err(SyntaxErrorKind::InvalidMarker {
                marker: kind.marker_name().to_string(),
                state,
            });
        }

        let attributes = parse_attributes(attribute_text)?;
        let body = match kind {
            OperationKind::Tasks => {
                self.open.group = Some(GroupBuilder {
                    line: number,
                    attributes,
                    operations: Vec::new(),
                });
                return Ok(());
            }
            OperationKind::Write => Body::Write(Vec::new()),
            OperationKind::Run => Body::Run(Vec::new()),
            OperationKind::Search => Body::Search {
                section: SearchSection::Pattern,
                pattern: Vec::new(),
                to: None,
                replacement: Vec::new(),
            },
        };
        self.open.current = Some(OperationBuilder {
            line: number,
            attributes,
            body,
        });
        Ok(())
    }

    fn enter_section(
        &mut self,
        marker: &str,
        section: SearchSection,
        state: State,
    ) -> Result<(), SyntaxErrorKind> {
        self.check_transition(marker, state)?;
        if let Some(op) = self.open.current.as_mut() {
            op.enter(section);
        }
        Ok(())
    }

    fn close(&mut self, attribute_text: &str, state: State) -> Result<(), SyntaxErrorKind> {
        if state == State::Idle {
            return Err(SyntaxErrorKind::NoActiveOperation {
                marker: END.to_string(),
            });
        }
        if !attribute_text.is_empty() {
            return Err(SyntaxErrorKind::EndWithAttributes);
        }
        self.check_transition(END, state)?;

        if let Some(op) = self.open.current.take() {
            let operation = op.into_operation();
            debug!(line = operation.line(), kind = %operation.kind(), "operation closed");
            match self.open.group.as_mut() {
                Some(group) => group.operations.push(operation),
                None => self.operations.push(operation),
            }
        } else if let Some(group) = self.open.group.take() {
            debug!(line = group.line, children = group.operations.len(), "TASKS closed");
            self.operations.push(group.into_operation());
        }
        Ok(())
    }

    fn check_transition(&self, marker: &str, state: State) -> Result<(), SyntaxErrorKind> {
        if state == State::Idle {
            return Err(SyntaxErrorKind::NoActiveOperation {
                marker: marker.to_string(),
            });
        }
        if !state.accepts(marker) {
            return Err(SyntaxErrorKind::InvalidMarker {
                marker: marker.to_string(),
                state,
            });
        }
        Ok(())
    }

    fn finalize(self) -> Result<Vec<Operation>, SyntaxError> {
        // An open group outranks the operation nested inside it.
        if let Some(group) = &self.open.group {
            return Err(SyntaxError::new(
                group.line,
                SyntaxErrorKind::Unterminated(OperationKind::Tasks),
            ));
        }
        if let Some(op) = &self.open.current {
            return Err(SyntaxError::new(
                op.line,
                SyntaxErrorKind::Unterminated(op.kind()),
            ));
        }
        Ok(self.operations)
    }
}
