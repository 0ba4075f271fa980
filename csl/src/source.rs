use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Byte ranges of every line in `text`, without their terminators.
///
/// `\r\n`, `\r` and `\n` all end a line. Text ending in a terminator has a
/// final empty line, and empty text is a single empty line.
pub fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for found in LINE_BREAK.find_iter(text) {
        ranges.push(start..found.start());
        start = found.end();
    }
    ranges.push(start..text.len());
    ranges
}

/// Byte range of the 1-based line `line`, clamped to the end of `text`.
///
/// Scans only up to the requested line.
pub fn line_range(text: &str, line: usize) -> Range<usize> {
    let index = line.saturating_sub(1);
    let mut start = 0;
    let mut breaks = 0;
    for found in LINE_BREAK.find_iter(text) {
        if breaks == index {
            return start..found.start();
        }
        start = found.end();
        breaks += 1;
    }
    if breaks == index {
        start..text.len()
    } else {
        text.len()..text.len()
    }
}
