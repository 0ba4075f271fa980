use std::fmt;

/// Where the parser is, derived from the open operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No operation open.
    Idle,
    /// A TASKS block is open with no nested operation.
    Tasks,
    Write,
    Run,
    SearchPattern,
    SearchTo,
    SearchReplacement,
}

pub const END: &str = "END";
pub const TO: &str = "TO";
pub const REPLACE: &str = "REPLACE";

/// Every name the marker grammar gives meaning to.
pub const KNOWN_MARKERS: &[&str] = &["WRITE", "RUN", "SEARCH", "TASKS", END, TO, REPLACE];

impl State {
    /// Whether non-marker lines are collected into a buffer.
    pub fn collects_content(self) -> bool {
        !matches!(self, State::Idle | State::Tasks)
    }

    /// Whether `name` is a legal transition out of this state.
    pub fn accepts(self, name: &str) -> bool {
        match self {
            State::Idle => matches!(name, "WRITE" | "RUN" | "SEARCH" | "TASKS"),
            State::Tasks => matches!(name, "WRITE" | "RUN" | "SEARCH" | END),
            State::Write | State::Run | State::SearchReplacement => name == END,
            State::SearchPattern => matches!(name, TO | REPLACE | END),
            State::SearchTo => name == REPLACE,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Idle => "IDLE",
            State::Tasks => "TASKS",
            State::Write => "WRITE",
            State::Run => "RUN",
            State::SearchPattern => "SEARCH PATTERN",
            State::SearchTo => "SEARCH TO",
            State::SearchReplacement => "SEARCH REPLACEMENT",
        };
        f.write_str(name)
    }
}
