use crate::operation::{Attributes, Operation};
use crate::parser::ParseOptions;
use crate::parser::state::{END, REPLACE, TO};

/// Render operations back to CSL text with the given delimiters.
///
/// Blank lines are inserted ahead of opening markers so each operation
/// lands on its recorded line whenever the lines before it leave room.
/// Parsing the output with the same delimiters yields the same operations.
pub fn print(operations: &[Operation], options: &ParseOptions) -> String {
    let mut printer = Printer {
        options,
        lines: Vec::new(),
    };
    for operation in operations {
        printer.operation(operation);
    }
    printer.lines.join("\n")
}

struct Printer<'a> {
    options: &'a ParseOptions,
    lines: Vec<String>,
}

impl Printer<'_> {
    fn operation(&mut self, operation: &Operation) {
        // Blank lines outside content are ignored by the parser.
        while self.lines.len() + 1 < operation.line() {
            self.lines.push(String::new());
        }
        self.marker(operation.kind().marker_name(), Some(operation.attributes()));
        match operation {
            Operation::Write(op) => self.text(&op.content),
            Operation::Run(op) => self.text(&op.content),
            Operation::Search(op) => {
                self.text(&op.pattern);
                if let Some(to) = &op.to {
                    self.marker(TO, None);
                    self.text(to);
                }
                self.marker(REPLACE, None);
                self.text(&op.replacement);
            }
            Operation::Tasks(op) => {
                for child in &op.operations {
                    self.operation(child);
                }
            }
        }
        self.marker(END, None);
    }

    fn marker(&mut self, name: &str, attributes: Option<&Attributes>) {
        let mut line = format!("{}{}", self.options.start_delimiter, name);
        for (key, value) in attributes.into_iter().flatten() {
            line.push(' ');
            line.push_str(key);
            line.push_str("=\"");
            line.push_str(&escape_value(value));
            line.push('"');
        }
        line.push_str(&self.options.end_delimiter);
        self.lines.push(line);
    }

    /// One entry per physical line, so `lines.len()` is the output line
    /// count. An empty buffer prints no lines; one empty line would parse
    /// the same.
    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.lines.extend(text.split('\n').map(str::to_string));
        }
    }
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
