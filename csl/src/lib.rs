pub mod operation;
pub mod parser;
pub mod printer;
pub mod source;
pub mod validator;

pub use operation::{Attributes, Count, Operation, OperationKind};
pub use parser::{ParseOptions, Parser, SyntaxError, SyntaxErrorKind};
pub use printer::print;
pub use validator::{ValidationError, validate};

use serde::Serialize;

/// A parsed CSL document with every semantic problem found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub ast: Vec<Operation>,
    pub validation_errors: Vec<ValidationError>,
}

/// Parse CSL text into operations. Fails on the first syntax error.
pub fn parse(text: &str, options: &ParseOptions) -> Result<Vec<Operation>, SyntaxError> {
    Parser::new(options).parse(text)
}

/// Parse and validate in one call. Only syntax errors fail; validation
/// errors are returned alongside the operations.
pub fn run(text: &str, options: &ParseOptions) -> Result<ParseResult, SyntaxError> {
    let ast = parse(text, options)?;
    let validation_errors = validate(&ast);
    Ok(ParseResult {
        ast,
        validation_errors,
    })
}
