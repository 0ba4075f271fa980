mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use csl::ParseOptions;
use csl::parser::{DEFAULT_END_DELIMITER, DEFAULT_START_DELIMITER};

const SUBCOMMANDS: &[&str] = &["check", "fmt", "test", "help"];

#[derive(Parser)]
#[command(name = "csl", version, about = "Change-Script Language parser and validator")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log parser activity to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a CSL document
    Check(CheckArgs),

    /// Print a CSL document in normalized form
    Fmt(FmtArgs),

    /// Run .test.csl fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct DelimiterArgs {
    /// Text that opens a marker line
    #[arg(long, default_value = DEFAULT_START_DELIMITER, allow_hyphen_values = true)]
    start_delimiter: String,

    /// Text that closes a marker line
    #[arg(long, default_value = DEFAULT_END_DELIMITER, allow_hyphen_values = true)]
    end_delimiter: String,
}

impl DelimiterArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            start_delimiter: self.start_delimiter.clone(),
            end_delimiter: self.end_delimiter.clone(),
        }
    }
}

#[derive(clap::Args)]
struct CheckArgs {
    /// CSL source file
    file: String,

    /// Dump the parsed operations
    #[arg(long)]
    ast: bool,

    /// Dump operations and validation errors as JSON
    #[arg(long, conflicts_with = "ast")]
    json: bool,

    #[command(flatten)]
    delimiters: DelimiterArgs,
}

#[derive(clap::Args)]
struct FmtArgs {
    /// CSL source file
    file: String,

    #[command(flatten)]
    delimiters: DelimiterArgs,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.csl file or a directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `csl file.csl` is shorthand for `csl check file.csl`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_positional = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|i| i + 1);
    if let Some(pos) = first_positional {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "check".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Check(check_args) => do_check(check_args, color_choice),
        Command::Fmt(fmt_args) => do_fmt(fmt_args, color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, color_choice, &test_args.category)
            }
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// A source file loaded into a codespan file database.
struct LoadedSource {
    files: SimpleFiles<String, String>,
    file_id: usize,
    text: String,
}

fn load_source(path: &str) -> Option<LoadedSource> {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path, e);
            return None;
        }
    };
    let mut files = SimpleFiles::new();
    let file_id = files.add(path.to_string(), text.clone());
    Some(LoadedSource {
        files,
        file_id,
        text,
    })
}

fn do_check(args: CheckArgs, color_choice: ColorChoice) -> i32 {
    let Some(source) = load_source(&args.file) else {
        return 1;
    };
    let writer = StandardStream::stderr(color_choice);

    let result = match csl::run(&source.text, &args.delimiters.options()) {
        Ok(result) => result,
        Err(error) => {
            emit(&writer, &source, &error.to_diagnostic(source.file_id, &source.text));
            return 1;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize result: {}", e);
                return 1;
            }
        }
    } else if args.ast {
        println!("{:#?}", result.ast);
    }

    for error in &result.validation_errors {
        emit(&writer, &source, &error.to_diagnostic(source.file_id, &source.text));
    }

    if result.validation_errors.is_empty() {
        eprintln!("ok: {} parsed successfully", args.file);
        0
    } else {
        eprintln!(
            "{}: {} validation error(s)",
            args.file,
            result.validation_errors.len()
        );
        1
    }
}

fn do_fmt(args: FmtArgs, color_choice: ColorChoice) -> i32 {
    let Some(source) = load_source(&args.file) else {
        return 1;
    };
    let options = args.delimiters.options();

    match csl::parse(&source.text, &options) {
        Ok(ast) => {
            println!("{}", csl::print(&ast, &options));
            0
        }
        Err(error) => {
            let writer = StandardStream::stderr(color_choice);
            emit(&writer, &source, &error.to_diagnostic(source.file_id, &source.text));
            1
        }
    }
}

fn emit(writer: &StandardStream, source: &LoadedSource, diagnostic: &Diagnostic<usize>) {
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, &source.files, diagnostic);
}
