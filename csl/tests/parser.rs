use csl::operation::{Run, Search, Tasks, Write};
use csl::{Attributes, Operation, ParseOptions, SyntaxErrorKind};

fn parse(source: &str) -> Vec<Operation> {
    csl::parse(source, &ParseOptions::default()).expect("parse failed")
}

fn parse_err(source: &str) -> String {
    csl::parse(source, &ParseOptions::default())
        .expect_err("expected a syntax error")
        .to_string()
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write(line: usize, pairs: &[(&str, &str)], content: &str) -> Operation {
    Operation::Write(Write {
        line,
        attributes: attrs(pairs),
        content: content.to_string(),
    })
}

fn run(line: usize, pairs: &[(&str, &str)], content: &str) -> Operation {
    Operation::Run(Run {
        line,
        attributes: attrs(pairs),
        content: content.to_string(),
    })
}

fn search(
    line: usize,
    pairs: &[(&str, &str)],
    pattern: &str,
    to: Option<&str>,
    replacement: &str,
) -> Operation {
    Operation::Search(Search {
        line,
        attributes: attrs(pairs),
        pattern: pattern.to_string(),
        to: to.map(str::to_string),
        replacement: replacement.to_string(),
    })
}

fn tasks(line: usize, pairs: &[(&str, &str)], operations: Vec<Operation>) -> Operation {
    Operation::Tasks(Tasks {
        line,
        attributes: attrs(pairs),
        operations,
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[test]
fn write_operation() {
    assert_eq!(
        parse("<---WRITE file=\"t.txt\"--->\nhi\n<---END--->"),
        vec![write(1, &[("file", "t.txt")], "hi")]
    );
    assert_eq!(
        parse("<---WRITE file=\"log.txt\" append=\"true\" custom=\"value\"--->\nnew entry\n<---END--->"),
        vec![write(
            1,
            &[("file", "log.txt"), ("append", "true"), ("custom", "value")],
            "new entry"
        )]
    );
}

#[test]
fn recognized_attributes_are_exposed() {
    let ops = parse("<---WRITE file=\"log.txt\" append=\"true\"--->\nx\n<---END--->");
    let Operation::Write(op) = &ops[0] else {
        panic!("expected WRITE, got {:?}", ops[0]);
    };
    assert_eq!(op.file(), Some("log.txt"));
    assert_eq!(op.append_mode(), Some(true));

    let ops = parse("<---RUN dir=\"./src\"--->\nls -la\n<---END--->");
    let Operation::Run(op) = &ops[0] else {
        panic!("expected RUN, got {:?}", ops[0]);
    };
    assert_eq!(op.dir(), Some("./src"));
}

#[test]
fn run_operation() {
    assert_eq!(
        parse("<---RUN--->\nnpm install\nnpm test\n<---END--->"),
        vec![run(1, &[], "npm install\nnpm test")]
    );
    assert_eq!(parse("<---RUN--->\n<---END--->"), vec![run(1, &[], "")]);
}

#[test]
fn search_with_replacement() {
    assert_eq!(
        parse("<---SEARCH file=\"a\"--->\nx\n<---REPLACE--->\ny\n<---END--->"),
        vec![search(1, &[("file", "a")], "x", None, "y")]
    );
    assert_eq!(
        parse("<---SEARCH file=\"test.py\"--->\ndef process():\n    return None\n<---REPLACE--->\ndef process():\n    return 42\n<---END--->"),
        vec![search(
            1,
            &[("file", "test.py")],
            "def process():\n    return None",
            None,
            "def process():\n    return 42"
        )]
    );
}

#[test]
fn search_with_range() {
    assert_eq!(
        parse("<---SEARCH file=\"main.py\" count=\"all\"--->\ndef process(\n<---TO--->\n    return result\n<---REPLACE--->\npass\n<---END--->"),
        vec![search(
            1,
            &[("file", "main.py"), ("count", "all")],
            "def process(",
            Some("    return result"),
            "pass"
        )]
    );
}

#[test]
fn search_to_without_lines_is_present_but_empty() {
    assert_eq!(
        parse("<---SEARCH file=\"a\"--->\nx\n<---TO--->\n<---REPLACE--->\ny\n<---END--->"),
        vec![search(1, &[("file", "a")], "x", Some(""), "y")]
    );
}

#[test]
fn search_closed_after_pattern() {
    assert_eq!(
        parse("<---SEARCH file=\"a\"--->\nremove me\n<---END--->"),
        vec![search(1, &[("file", "a")], "remove me", None, "")]
    );
}

#[test]
fn tasks_blocks() {
    assert_eq!(
        parse("<---TASKS version=\"1.0\"--->\n<---END--->"),
        vec![tasks(1, &[("version", "1.0")], vec![])]
    );
    assert_eq!(
        parse(
            "<---TASKS--->\n<---WRITE file=\"file1.txt\"--->\ncontent1\n<---END--->\n<---RUN--->\necho done\n<---END--->\n<---SEARCH file=\"config.json\"--->\nfalse\n<---REPLACE--->\ntrue\n<---END--->\n<---END--->"
        ),
        vec![tasks(
            1,
            &[],
            vec![
                write(2, &[("file", "file1.txt")], "content1"),
                run(5, &[], "echo done"),
                search(8, &[("file", "config.json")], "false", None, "true"),
            ]
        )]
    );
}

#[test]
fn operations_in_sequence() {
    assert_eq!(
        parse("<---WRITE file=\"a\"--->\n1\n<---END--->\n\nnotes between operations\n<---TASKS--->\nignored inside TASKS\n<---RUN--->\nls\n<---END--->\n<---END--->\n"),
        vec![
            write(1, &[("file", "a")], "1"),
            tasks(6, &[], vec![run(8, &[], "ls")]),
        ]
    );
}

#[test]
fn empty_input_has_no_operations() {
    assert_eq!(parse(""), vec![]);
    assert_eq!(parse("just prose\n\n"), vec![]);
}

// ---------------------------------------------------------------------------
// Attributes on markers
// ---------------------------------------------------------------------------

#[test]
fn attribute_quoting_and_names() {
    assert_eq!(
        parse("<---WRITE file='quote\"inside.txt'--->\nc\n<---END--->"),
        vec![write(1, &[("file", "quote\"inside.txt")], "c")]
    );
    assert_eq!(
        parse("<---WRITE file = \"test.txt\"    append=\"true\"--->\nc\n<---END--->"),
        vec![write(1, &[("file", "test.txt"), ("append", "true")], "c")]
    );
    assert_eq!(
        parse("<---WRITE @file=\"a\" file-name=\"b\" 123=\"c\" $$$=\"d\"--->\nc\n<---END--->"),
        vec![write(
            1,
            &[("@file", "a"), ("file-name", "b"), ("123", "c"), ("$$$", "d")],
            "c"
        )]
    );
    assert_eq!(
        parse(r#"<---WRITE file="C:\\Users\\test.txt" other="test\nfile"--->
c
<---END--->"#),
        vec![write(
            1,
            &[("file", r"C:\Users\test.txt"), ("other", r"test\nfile")],
            "c"
        )]
    );
}

#[test]
fn attribute_errors_abort_parse() {
    assert_eq!(
        parse_err("<---WRITE file=\"a\" file=\"b\"--->\nc\n<---END--->"),
        "Line 1: Duplicate attribute: file"
    );
    assert_eq!(
        parse_err("<---SEARCH file=\"test.js\" count=\"1\" count=\"all\"--->\np\n<---REPLACE--->\nr\n<---END--->"),
        "Line 1: Duplicate attribute: count"
    );
    assert_eq!(
        parse_err("<---WRITE file=\"test.txt--->\nc\n<---END--->"),
        "Line 1: Unterminated quoted value"
    );
    assert_eq!(
        parse_err("<---WRITE file='test.txt\"--->\nc\n<---END--->"),
        "Line 1: Unterminated quoted value"
    );
    assert_eq!(
        parse_err("<---WRITE file=test.txt--->\nc\n<---END--->"),
        "Line 1: Unquoted attribute value"
    );
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[test]
fn blank_lines_are_kept() {
    assert_eq!(
        parse("<---WRITE file=\"t\"--->\ncontent\n\n\n<---END--->"),
        vec![write(1, &[("file", "t")], "content\n\n")]
    );
}

#[test]
fn line_endings_are_normalized() {
    assert_eq!(
        parse("<---WRITE file=\"t\"--->\r\ncontent\r\n\r\n<---END--->"),
        vec![write(1, &[("file", "t")], "content\n")]
    );
    assert_eq!(
        parse("<---WRITE file=\"t\"--->\rone\rtwo\r<---END--->"),
        vec![write(1, &[("file", "t")], "one\ntwo")]
    );
    assert_eq!(
        parse("<---RUN--->\r\na\nb\rc\r\n<---END--->\r\n<---RUN--->\rd\r<---END--->"),
        vec![run(1, &[], "a\nb\nc"), run(6, &[], "d")]
    );
}

#[test]
fn marker_like_content_inside_operations() {
    assert_eq!(
        parse("<---WRITE file=\"t\"--->\nThis looks like <---WRITE---> but is just content\n<---NOT-A-VALID-MARKER--->\n<---CUSTOM--->\n<---END --->\n<---END--->"),
        vec![write(
            1,
            &[("file", "t")],
            "This looks like <---WRITE---> but is just content\n<---NOT-A-VALID-MARKER--->\n<---CUSTOM--->\n<---END --->"
        )]
    );
}

// ---------------------------------------------------------------------------
// State machine errors
// ---------------------------------------------------------------------------

#[test]
fn marker_not_valid_for_state() {
    assert_eq!(
        parse_err("<---WRITE file=\"t\"--->\n<---REPLACE--->\ninvalid\n<---END--->"),
        "Line 2: REPLACE marker not valid in WRITE operation"
    );
    assert_eq!(
        parse_err("<---RUN--->\n<---TO--->\ninvalid\n<---END--->"),
        "Line 2: TO marker not valid in RUN operation"
    );
    assert_eq!(
        parse_err("<---WRITE file=\"a\"--->\ncontent\n<---WRITE file=\"b\"--->"),
        "Line 3: WRITE marker not valid in WRITE operation"
    );
    assert_eq!(
        parse_err("<---SEARCH file=\"a\"--->\nx\n<---TO--->\ny\n<---END--->"),
        "Line 5: END marker not valid in SEARCH TO operation"
    );
    assert_eq!(
        parse_err("<---SEARCH file=\"a\"--->\nx\n<---REPLACE--->\ny\n<---TO--->\n<---END--->"),
        "Line 5: TO marker not valid in SEARCH REPLACEMENT operation"
    );
    assert_eq!(
        parse_err("<---TASKS--->\n<---REPLACE--->\n<---END--->"),
        "Line 2: REPLACE marker not valid in TASKS operation"
    );
}

#[test]
fn control_markers_without_operation() {
    assert_eq!(parse_err("<---END--->"), "Line 1: END marker without active operation");
    assert_eq!(parse_err("\n<---TO--->"), "Line 2: TO marker without active operation");
}

#[test]
fn unterminated_operations() {
    assert_eq!(
        parse_err("<---WRITE file=\"t\"--->\ncontent"),
        "Line 1: Unterminated WRITE operation"
    );
    assert_eq!(
        parse_err("<---SEARCH file=\"t\"--->\np\n<---REPLACE--->\nr"),
        "Line 1: Unterminated SEARCH operation"
    );
    assert_eq!(
        parse_err("<---WRITE file=\"t\"--->\n<---END --->"),
        "Line 1: Unterminated WRITE operation"
    );
}

#[test]
fn unterminated_tasks_outranks_nested_operation() {
    assert_eq!(
        parse_err("\n<---TASKS--->\n<---RUN--->\necho"),
        "Line 2: Unterminated TASKS operation"
    );
}

#[test]
fn tasks_cannot_nest() {
    assert_eq!(
        parse_err("<---TASKS--->\n<---TASKS--->\n<---END--->\n<---END--->"),
        "Line 2: TASKS cannot be nested"
    );
    assert_eq!(
        parse_err("<---TASKS--->\n<---RUN--->\n<---TASKS--->\n<---END--->\n<---END--->"),
        "Line 3: TASKS cannot be nested"
    );
    assert_eq!(
        parse_err("<---RUN--->\n<---TASKS--->\n<---END--->"),
        "Line 2: TASKS marker not valid in RUN operation"
    );
}

#[test]
fn malformed_markers() {
    for source in [
        "<---WRITE file=\"test.txt\"-->\ncontent\n<---END--->",
        "<--- WRITE file=\"test.txt\"--->\ncontent\n<---END--->",
        "<---WRITE file=\"test.txt\" --->\ncontent\n<---END--->",
        "<---this is not a valid marker\ncontent\n<---END--->",
        "<---\ncontent\n<---END--->",
        "<---WRITE",
    ] {
        assert_eq!(parse_err(source), "Line 1: Malformed marker", "source: {source:?}");
    }
    assert_eq!(
        parse_err("<---TASKS--->\n<---RUN\n<---END--->"),
        "Line 2: Malformed marker"
    );
}

#[test]
fn lines_without_start_delimiter_are_not_markers() {
    // `<--` is prose at the top level, so the END has nothing to close.
    assert_eq!(
        parse_err("<--WRITE file=\"test.txt\"--->\ncontent\n<---END--->"),
        "Line 3: END marker without active operation"
    );
}

#[test]
fn unknown_operations() {
    assert_eq!(parse_err("<---INVALID--->\n<---END--->"), "Line 1: Unknown operation: INVALID");
    assert_eq!(
        parse_err("<---UNKNOWN file=\"test.txt\"--->\ncontent\n<---END--->"),
        "Line 1: Unknown operation: UNKNOWN"
    );
    assert_eq!(parse_err("<---write file=\"t\"--->\nc\n<---END--->"), "Line 1: Unknown operation: write");
    assert_eq!(parse_err("<---Write file=\"t\"--->\nc\n<---END--->"), "Line 1: Unknown operation: Write");
    assert_eq!(
        parse_err("<---TASKS--->\n<---run--->\necho test\n<---END--->\n<---END--->"),
        "Line 2: Unknown operation: run"
    );
}

#[test]
fn trailing_text_on_marker_line() {
    assert_eq!(
        parse_err("<---WRITE file=\"t\"--->\ncontent\n<---END---> extra text"),
        "Line 3: Content not allowed on marker line"
    );
    assert_eq!(
        parse_err("<---WRITE file=\"t\"---> inline content\nmore\n<---END--->"),
        "Line 1: Content not allowed on marker line"
    );
}

#[test]
fn trailing_text_after_marker_not_valid_here_is_content() {
    assert_eq!(
        parse("<---WRITE file=\"t\"--->\n<---RUN---> is a marker\n<---END--->"),
        vec![write(1, &[("file", "t")], "<---RUN---> is a marker")]
    );
}

#[test]
fn end_with_attributes() {
    assert_eq!(
        parse_err("<---WRITE file=\"t\"--->\ncontent\n<---END attr=\"value\"--->"),
        "Line 3: END marker cannot have attributes"
    );
    assert_eq!(
        parse_err("<---RUN--->\necho test\n<---END debug=\"true\"--->"),
        "Line 3: END marker cannot have attributes"
    );
}

#[test]
fn syntax_error_exposes_line_and_kind() {
    let err = csl::parse("<---RUN--->\n<---END x=\"1\"--->", &ParseOptions::default())
        .expect_err("expected a syntax error");
    assert_eq!(err.line, 2);
    assert_eq!(err.kind, SyntaxErrorKind::EndWithAttributes);
    assert_eq!(err.reason(), "END marker cannot have attributes");
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[test]
fn custom_delimiters() {
    let options = ParseOptions {
        start_delimiter: "@[[[[".to_string(),
        end_delimiter: "]]]]@".to_string(),
    };
    let parse_with = |source: &str| csl::parse(source, &options).expect("parse failed");

    assert_eq!(
        parse_with("@[[[[WRITE file=\"test.txt\"]]]]@\ncontent\n@[[[[END]]]]@"),
        vec![write(1, &[("file", "test.txt")], "content")]
    );
    assert_eq!(
        parse_with("@[[[[TASKS]]]]@\n@[[[[RUN]]]]@\necho test\n@[[[[END]]]]@\n@[[[[END]]]]@"),
        vec![tasks(1, &[], vec![run(2, &[], "echo test")])]
    );
    // Default markers are plain content under other delimiters.
    assert_eq!(
        parse_with("@[[[[RUN]]]]@\n<---END--->\n@[[[[END]]]]@"),
        vec![run(1, &[], "<---END--->")]
    );
}

#[test]
fn delimiters_are_literal_text() {
    let options = ParseOptions {
        start_delimiter: "(.*".to_string(),
        end_delimiter: "+)".to_string(),
    };
    assert_eq!(
        csl::parse("(.*RUN+)\nls\n(.*END+)", &options).expect("parse failed"),
        vec![run(1, &[], "ls")]
    );
    assert_eq!(
        csl::parse("(.*RUN+)\n(xxEND+)\n(.*END+)", &options).expect("parse failed"),
        vec![run(1, &[], "(xxEND+)")]
    );
}

#[test]
fn metacharacter_delimiters_detect_trailing_text() {
    let options = ParseOptions {
        start_delimiter: "[?".to_string(),
        end_delimiter: "$|^".to_string(),
    };
    let err = csl::parse("[?RUN$|^ echo\nls\n[?END$|^", &options).expect_err("expected error");
    assert_eq!(err.to_string(), "Line 1: Content not allowed on marker line");
    assert_eq!(
        csl::parse("[?RUN dir=\"x\"$|^\nls\n[?END$|^", &options).expect("parse failed"),
        vec![run(1, &[("dir", "x")], "ls")]
    );
}

#[test]
fn parser_is_reusable() {
    let parser = csl::Parser::default();
    let first = parser.parse("<---RUN--->\nls\n<---END--->").expect("parse failed");
    assert!(parser.parse("<---RUN--->").is_err());
    let again = parser.parse("<---RUN--->\nls\n<---END--->").expect("parse failed");
    assert_eq!(first, again);
}
