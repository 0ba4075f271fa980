use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;
use tracing::debug;

use csl::{ParseOptions, ParseResult, ValidationError};

const TEST_SUFFIX: &str = ".test.csl";

#[derive(Debug, Deserialize)]
pub struct ExpectedValidationError {
    /// Substring that must appear in the error message.
    pub contains: String,

    /// If set, the error must be reported on this 1-based line.
    #[serde(default)]
    pub line: Option<usize>,

    /// If set, the error must come from the TASKS block opened on this line.
    #[serde(default)]
    pub parent_task_line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// `start_delimiter` / `end_delimiter`; defaults apply when omitted.
    #[serde(flatten)]
    pub options: ParseOptions,

    /// The syntax error's message must contain this substring.
    #[serde(default)]
    pub expect_parse_error: Option<String>,

    /// Number of top-level operations.
    #[serde(default)]
    pub expect_operations: Option<usize>,

    /// If present (even empty), the error count and each entry are checked in order.
    #[serde(default)]
    pub expect_validation_errors: Option<Vec<ExpectedValidationError>>,
}

/// Split a `.test.csl` file into its TOML frontmatter and CSL source.
/// Lines of the returned source are numbered from 1 after the closing `---`.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
        .unwrap_or(after_open);

    let close = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let frontmatter = after_open[..close].trim_end_matches('\r');
    let rest = &after_open[close + "\n---".len()..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config = toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, source))
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    /// `Err` holds the failure reason.
    pub outcome: Result<(), String>,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let failed = |reason: String| TestResult {
        path: path.to_path_buf(),
        description: None,
        outcome: Err(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return failed(format!("cannot read file: {}", e)),
    };
    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return failed(format!("frontmatter error: {}", e)),
    };

    debug!(path = %path.display(), "running fixture");
    let outcome = check_expectations(&config, csl::run(source, &config.options));
    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

fn check_expectations(
    config: &TestConfig,
    result: Result<ParseResult, csl::SyntaxError>,
) -> Result<(), String> {
    let result = match (&config.expect_parse_error, result) {
        (Some(expected), Err(error)) => {
            let message = error.to_string();
            return if message.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "expected parse error containing \"{}\", got: {}",
                    expected, message
                ))
            };
        }
        (Some(expected), Ok(_)) => {
            return Err(format!(
                "expected parse error containing \"{}\", but parsing succeeded",
                expected
            ));
        }
        (None, Err(error)) => return Err(format!("unexpected parse error: {}", error)),
        (None, Ok(result)) => result,
    };

    if let Some(expected) = config.expect_operations {
        if result.ast.len() != expected {
            return Err(format!(
                "expected {} top-level operation(s), got {}",
                expected,
                result.ast.len()
            ));
        }
    }

    if let Some(expected) = &config.expect_validation_errors {
        check_validation_errors(&result.validation_errors, expected)?;
    }

    Ok(())
}

fn check_validation_errors(
    actual: &[ValidationError],
    expected: &[ExpectedValidationError],
) -> Result<(), String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|e| format!("  - line {}: {}", e.line, e.message)).collect();
        return Err(format!(
            "expected {} validation error(s), got {}\n  actual errors:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Err(format!(
                "error[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }
        if let Some(line) = expected.line {
            if actual.line != line {
                return Err(format!(
                    "error[{}]: expected on line {}, got line {}",
                    i, line, actual.line
                ));
            }
        }
        if expected.parent_task_line.is_some() && actual.parent_task_line != expected.parent_task_line {
            return Err(format!(
                "error[{}]: expected parent TASKS line {:?}, got {:?}",
                i, expected.parent_task_line, actual.parent_task_line
            ));
        }
    }
    Ok(())
}

/// Fixture files grouped by their folder relative to `root`, sorted.
/// Files directly under `root` land in category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the categories named in `requested`, including their subfolders.
/// An empty request keeps everything.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let mut found = false;
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
                found = true;
            }
        }
        if !found {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Writes PASS/FAIL lines and the closing summary to stderr.
struct Reporter {
    out: StandardStream,
    passed: usize,
    failures: Vec<TestResult>,
}

impl Reporter {
    fn new(color_choice: ColorChoice) -> Self {
        Reporter {
            out: StandardStream::stderr(color_choice),
            passed: 0,
            failures: Vec::new(),
        }
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) {
        let _ = self.out.set_color(spec);
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    fn header(&mut self, category: &str) {
        let _ = writeln!(self.out);
        self.styled(category_label(category), ColorSpec::new().set_bold(true));
        let _ = writeln!(self.out);
    }

    fn record(&mut self, result: TestResult) {
        let _ = write!(self.out, "  ");
        if result.outcome.is_ok() {
            self.styled("PASS", ColorSpec::new().set_fg(Some(Color::Green)));
            self.passed += 1;
        } else {
            self.styled("FAIL", ColorSpec::new().set_fg(Some(Color::Red)));
        }
        let _ = writeln!(self.out, "  {}", result.label());
        if result.outcome.is_err() {
            self.failures.push(result);
        }
    }

    /// Print failure details and the summary line; returns the exit code.
    fn finish(mut self) -> i32 {
        let failures = std::mem::take(&mut self.failures);
        if !failures.is_empty() {
            let _ = writeln!(self.out, "\nfailures:");
            for failure in &failures {
                let _ = writeln!(self.out, "\n  --- {} ---", failure.path.display());
                if let Err(reason) = &failure.outcome {
                    for line in reason.lines() {
                        let _ = writeln!(self.out, "  {}", line);
                    }
                }
            }
        }

        let _ = write!(self.out, "\ntest result: ");
        if failures.is_empty() {
            self.styled("ok", ColorSpec::new().set_fg(Some(Color::Green)));
            let _ = writeln!(self.out, ". {} passed, 0 failed", self.passed);
            0
        } else {
            self.styled("FAILED", ColorSpec::new().set_fg(Some(Color::Red)));
            let _ = writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                self.passed,
                failures.len(),
                self.passed + failures.len()
            );
            1
        }
    }
}

/// Run every `.test.csl` file under `path`, or `path` itself if it is a file.
/// Returns 0 when all pass, 1 otherwise.
pub fn run_tests(path: &Path, color_choice: ColorChoice, categories: &[String]) -> i32 {
    let mut reporter = Reporter::new(color_choice);

    if path.is_file() {
        reporter.record(run_single_test(path));
        return reporter.finish();
    }

    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    for (category, files) in selected {
        reporter.header(category);
        for file in files {
            reporter.record(run_single_test(file));
        }
    }
    reporter.finish()
}
