//! padspart - inspect, validate and normalize PADS part type libraries.

use clap::{Parser, Subcommand, ValueEnum};
use pads_parttype::{
    line_col, Issue, Library, ParseError, Rule, Severity, ValidationOptions, ValidationReport,
    Validator,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "padspart")]
#[command(about = "PADS library part type reader and validator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a part type library file
    Check {
        /// Path to the library file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// JSON file with validation options
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Treat attribute count mismatches as errors
        #[arg(long)]
        strict: bool,

        /// Exit with error code if issues found at this severity or higher
        #[arg(long, value_enum, default_value = "error")]
        fail_on: FailOnSeverity,
    },

    /// Print the parts of a library file
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Rewrite a library file in canonical form
    Fmt {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write here instead of standard output
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List available validation rules
    Rules,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
    Info,
}

impl From<FailOnSeverity> for Severity {
    fn from(value: FailOnSeverity) -> Self {
        match value {
            FailOnSeverity::Error => Severity::Error,
            FailOnSeverity::Warning => Severity::Warning,
            FailOnSeverity::Info => Severity::Info,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Check {
            file,
            format,
            config,
            strict,
            fail_on,
        } => handle_check(&file, format, config.as_deref(), strict, fail_on),
        Commands::Show { file, format } => handle_show(&file, format),
        Commands::Fmt { file, output } => handle_fmt(&file, output.as_deref()),
        Commands::Rules => {
            handle_rules();
            0
        }
    };

    process::exit(exit_code);
}

fn read(file: &Path) -> Option<String> {
    debug!(file = %file.display(), "reading library");
    match std::fs::read_to_string(file) {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            None
        }
    }
}

fn report_parse_error(file: &Path, input: &str, err: &ParseError) {
    error!(file = %file.display(), %err, "parse failed");
    match err.span() {
        Some(span) => {
            let (line, col) = line_col(input, span.start);
            eprintln!("Error: {}:{}:{}: {}", file.display(), line, col, err);
        }
        None => eprintln!("Error: {}: {}", file.display(), err),
    }
}

fn handle_check(
    file: &Path,
    format: OutputFormat,
    config: Option<&Path>,
    strict: bool,
    fail_on: FailOnSeverity,
) -> i32 {
    let mut options = match config {
        Some(path) => match ValidationOptions::from_json_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => ValidationOptions::default(),
    };
    options.strict |= strict;

    let Some(input) = read(file) else {
        return 1;
    };
    let library = match Library::parse(&input) {
        Ok(library) => library,
        Err(e) => {
            report_parse_error(file, &input, &e);
            return 1;
        }
    };

    let report = Validator::new(options).validate(&library);
    match format {
        OutputFormat::Human => output_human(file, &report),
        OutputFormat::Json => output_json(file, &report),
    }

    let threshold = Severity::from(fail_on);
    match report.max_severity() {
        Some(severity) if severity >= threshold => 1,
        _ => 0,
    }
}

fn output_human(file: &Path, report: &ValidationReport) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if report.is_clean() {
        println!("  No issues found");
        return;
    }

    for severity in [Severity::Error, Severity::Warning, Severity::Info] {
        let issues: Vec<&Issue> = report
            .issues
            .iter()
            .filter(|i| i.severity == severity)
            .collect();
        if issues.is_empty() {
            continue;
        }
        println!("\n  {}:", severity.to_string().to_uppercase());
        for issue in issues {
            match &issue.part {
                Some(part) => println!("    - [{}] {}: {}", issue.rule, part, issue.message),
                None => println!("    - [{}] {}", issue.rule, issue.message),
            }
        }
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", report.stats.errors);
    println!("    Warnings: {}", report.stats.warnings);
    println!("    Info:     {}", report.stats.infos);
}

fn output_json(file: &Path, report: &ValidationReport) {
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "issues": report.issues,
        "stats": report.stats,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_show(file: &Path, format: OutputFormat) -> i32 {
    let Some(input) = read(file) else {
        return 1;
    };
    let library = match Library::parse(&input) {
        Ok(library) => library,
        Err(e) => {
            report_parse_error(file, &input, &e);
            return 1;
        }
    };

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&library) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        OutputFormat::Human => {
            for part in &library.parts {
                println!("{} ({})", part.name, part.decals.join(", "));
                if let Some(description) = part.description() {
                    println!("  {}", description);
                }
                for attr in &part.attributes {
                    println!("  {:<28} {}", attr.name, attr.value);
                }
                for (i, gate) in part.gates.iter().enumerate() {
                    println!("  Gate {} ({})", i + 1, gate.decals.join(", "));
                    for pin in &gate.pins {
                        println!("    {:>4}  {:<8} {:?}", pin.num, pin.name, pin.typ);
                    }
                }
                for pin in &part.signal_pins {
                    println!("  Signal {:>4}  {}", pin.num, pin.signal);
                }
            }
            if let Some(provenance) = library.remark.as_ref().and_then(|r| r.provenance()) {
                println!("Source: {}", provenance);
            }
        }
    }
    0
}

fn handle_fmt(file: &Path, output: Option<&Path>) -> i32 {
    let Some(input) = read(file) else {
        return 1;
    };
    let library = match Library::parse(&input) {
        Ok(library) => library,
        Err(e) => {
            report_parse_error(file, &input, &e);
            return 1;
        }
    };

    let text = library.to_string();
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text) {
                eprintln!("Error: {}: {}", path.display(), e);
                return 1;
            }
        }
        None => print!("{}", text),
    }
    0
}

fn handle_rules() {
    println!("Available validation rules:\n");
    for rule in Rule::ALL {
        println!("  {}", rule);
        println!("    {}", rule.description());
        println!();
    }
}
