pub mod count;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

pub use count::Count;

/// Attributes from an opening marker, in declaration order.
pub type Attributes = IndexMap<String, String>;

/// The four operation kinds a CSL document can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Write,
    Run,
    Search,
    Tasks,
}

impl OperationKind {
    /// The marker name that opens an operation of this kind.
    pub fn marker_name(self) -> &'static str {
        match self {
            OperationKind::Write => "WRITE",
            OperationKind::Run => "RUN",
            OperationKind::Search => "SEARCH",
            OperationKind::Tasks => "TASKS",
        }
    }

    pub fn from_marker_name(name: &str) -> Option<Self> {
        match name {
            "WRITE" => Some(OperationKind::Write),
            "RUN" => Some(OperationKind::Run),
            "SEARCH" => Some(OperationKind::Search),
            "TASKS" => Some(OperationKind::Tasks),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker_name())
    }
}

/// One parsed unit of a CSL document.
///
/// The raw attribute map always holds every attribute from the opening
/// marker, including the recognized ones (`file`, `append`, `dir`, `count`),
/// which are additionally reachable through typed accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Operation {
    Write(Write),
    Run(Run),
    Search(Search),
    Tasks(Tasks),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Write(_) => OperationKind::Write,
            Operation::Run(_) => OperationKind::Run,
            Operation::Search(_) => OperationKind::Search,
            Operation::Tasks(_) => OperationKind::Tasks,
        }
    }

    /// 1-based source line of the opening marker.
    pub fn line(&self) -> usize {
        match self {
            Operation::Write(op) => op.line,
            Operation::Run(op) => op.line,
            Operation::Search(op) => op.line,
            Operation::Tasks(op) => op.line,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Operation::Write(op) => &op.attributes,
            Operation::Run(op) => &op.attributes,
            Operation::Search(op) => &op.attributes,
            Operation::Tasks(op) => &op.attributes,
        }
    }
}

/// `WRITE`: replace (or append to) a file with the given content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Write {
    pub line: usize,
    pub attributes: Attributes,
    pub content: String,
}

impl Write {
    /// Target path. An empty value counts as absent.
    pub fn file(&self) -> Option<&str> {
        non_empty(&self.attributes, "file")
    }

    /// Raw `append` value, if declared.
    pub fn append(&self) -> Option<&str> {
        self.attributes.get("append").map(String::as_str)
    }

    /// `append` as a flag; `None` when absent or outside `true`/`false`.
    pub fn append_mode(&self) -> Option<bool> {
        match self.append()? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// `RUN`: a shell command block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub line: usize,
    pub attributes: Attributes,
    pub content: String,
}

impl Run {
    /// Working directory for the command.
    pub fn dir(&self) -> Option<&str> {
        self.attributes.get("dir").map(String::as_str)
    }
}

/// `SEARCH`: replace `pattern` (or the range `pattern`..`to`) in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Search {
    pub line: usize,
    pub attributes: Attributes,
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub replacement: String,
}

impl Search {
    /// Target path. An empty value counts as absent.
    pub fn file(&self) -> Option<&str> {
        non_empty(&self.attributes, "file")
    }

    /// Raw `count` value, if declared.
    pub fn count(&self) -> Option<&str> {
        self.attributes.get("count").map(String::as_str)
    }
}

/// `TASKS`: a group of operations. Children are never `TASKS` in a
/// document accepted by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tasks {
    pub line: usize,
    pub attributes: Attributes,
    pub operations: Vec<Operation>,
}

fn non_empty<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
