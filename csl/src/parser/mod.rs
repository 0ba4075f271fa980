pub mod attributes;
pub mod delimiter;
pub mod error;
mod machine;
pub mod marker;
pub mod state;

pub use attributes::{AttributeError, parse_attributes};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use state::State;

use serde::Deserialize;

use crate::operation::Operation;
use crate::parser::delimiter::MarkerPattern;

pub const DEFAULT_START_DELIMITER: &str = "<---";
pub const DEFAULT_END_DELIMITER: &str = "--->";

/// Marker delimiters. Empty delimiters are not rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Marks the start of an operation marker line.
    pub start_delimiter: String,
    /// Marks the end of an operation marker line.
    pub end_delimiter: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            start_delimiter: DEFAULT_START_DELIMITER.to_string(),
            end_delimiter: DEFAULT_END_DELIMITER.to_string(),
        }
    }
}

/// Parser entry point. Holds only the compiled delimiters, so one parser
/// can be reused for any number of independent documents.
#[derive(Debug, Clone)]
pub struct Parser {
    pattern: MarkerPattern,
}

impl Parser {
    pub fn new(options: &ParseOptions) -> Self {
        Parser {
            pattern: MarkerPattern::compile(options),
        }
    }

    /// Parse CSL text into its operation list, stopping at the first
    /// syntax error.
    pub fn parse(&self, source: &str) -> Result<Vec<Operation>, SyntaxError> {
        machine::parse_operations(source, &self.pattern)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(&ParseOptions::default())
    }
}
