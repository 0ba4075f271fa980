use crate::parser::delimiter::{MarkerMatch, MarkerPattern};
use crate::parser::error::SyntaxErrorKind;
use crate::parser::state::{KNOWN_MARKERS, State};

/// What one input line means in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Literal text; collected if an operation is open, ignored otherwise.
    Content,
    Marker(MarkerMatch<'a>),
}

/// Classify `line` for `state`.
///
/// While an operation collects content, delimiter-prefixed text that is not
/// a meaningful marker is literal content. Outside one, it is an error.
pub fn classify<'a>(
    pattern: &MarkerPattern,
    line: &'a str,
    state: State,
) -> Result<LineClass<'a>, SyntaxErrorKind> {
    if !pattern.is_candidate(line) {
        return Ok(LineClass::Content);
    }

    if let Some(marker) = pattern.match_line(line) {
        if state.collects_content() && !KNOWN_MARKERS.contains(&marker.name) {
            return Ok(LineClass::Content);
        }
        return Ok(LineClass::Marker(marker));
    }

    if let Some((marker, _trailing)) = pattern.match_prefix(line) {
        if state.accepts(marker.name) {
            return Err(SyntaxErrorKind::ContentOnMarkerLine);
        }
    }

    if state.collects_content() {
        Ok(LineClass::Content)
    } else {
        Err(SyntaxErrorKind::MalformedMarker)
    }
}
