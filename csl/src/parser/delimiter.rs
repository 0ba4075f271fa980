use regex::Regex;

use crate::parser::ParseOptions;

/// Compiled marker patterns for one pair of delimiters.
///
/// Delimiters are literal text; every character is escaped before it
/// reaches the pattern engine.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    start: String,
    /// `START NAME [WS ATTRS] END`, anchored to the whole line.
    line: Regex,
    /// The same marker anchored only at the start, to detect trailing text.
    prefix: Regex,
}

/// A line that matched the marker grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch<'a> {
    pub name: &'a str,
    /// Raw text between the name and the end delimiter, empty if none.
    pub attributes: &'a str,
}

impl MarkerPattern {
    pub fn compile(options: &ParseOptions) -> Self {
        let start = regex::escape(&options.start_delimiter);
        let end = regex::escape(&options.end_delimiter);
        // ATTRS must end in a non-space so `<---END --->` stays malformed.
        let marker = format!(r"^{start}((?-u:\w)+)(?:\s+(.*\S))?{end}");

        MarkerPattern {
            start: options.start_delimiter.clone(),
            line: compile_escaped(&format!("{marker}$")),
            prefix: compile_escaped(&marker),
        }
    }

    /// Whether `line` opens with the start delimiter at all.
    pub fn is_candidate(&self, line: &str) -> bool {
        line.starts_with(self.start.as_str())
    }

    /// Match a whole line as a marker.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<MarkerMatch<'a>> {
        let caps = self.line.captures(line)?;
        Some(MarkerMatch {
            name: caps.get(1)?.as_str(),
            attributes: caps.get(2).map_or("", |m| m.as_str()),
        })
    }

    /// Match a marker at the start of `line` that is followed by more text.
    /// Returns the marker and the trailing text.
    pub fn match_prefix<'a>(&self, line: &'a str) -> Option<(MarkerMatch<'a>, &'a str)> {
        let caps = self.prefix.captures(line)?;
        let whole = caps.get(0)?;
        let trailing = &line[whole.end()..];
        if trailing.is_empty() {
            return None;
        }
        let marker = MarkerMatch {
            name: caps.get(1)?.as_str(),
            attributes: caps.get(2).map_or("", |m| m.as_str()),
        };
        Some((marker, trailing))
    }
}

/// Compile a pattern whose only variable parts went through `regex::escape`.
fn compile_escaped(pattern: &str) -> Regex {
    Regex::new(pattern).expect("escaped delimiters form a valid pattern")
}
