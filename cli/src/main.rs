use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use input_rules_config::{RequestDocument, RulesetConfig};
use input_rules_core::{RequestInput, Scope, ScopeInput};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

/// Exit status when the request violates the rules.
const EXIT_INVALID: i32 = 2;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "input-rules")]
#[command(version, about = "Declarative request input validation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a request document against a rule set.
    Check(CheckArgs),
    /// Check rule-set files for definition errors.
    Lint(LintArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Rule-set definition file (.yml, .yaml or .json).
    #[arg(long)]
    rules: PathBuf,
    /// Request document with `query` and/or `body` members.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Raw query string; replaces the document's query values.
    #[arg(long)]
    query: Option<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Also print the input after default seeding and coercion.
    #[arg(long)]
    print_input: bool,
}

#[derive(Debug, Args)]
struct LintArgs {
    /// Rule-set definition files.
    #[arg(long, required = true, num_args = 1..)]
    rules: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Lint(args) => run_lint(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_INVALID),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// check command
// ---------------------------------------------------------------------------

/// Returns `Ok(true)` when the request satisfies every rule.
fn run_check(args: CheckArgs) -> Result<bool, String> {
    let config = RulesetConfig::load(&args.rules)
        .map_err(|e| format!("Failed to load rules '{}': {e}", args.rules.display()))?;
    let mut ruleset = config
        .to_ruleset()
        .map_err(|e| format!("Invalid rules in '{}': {e}", args.rules.display()))?;

    let mut request = match &args.input {
        Some(path) => RequestDocument::load(path)
            .map_err(|e| format!("Failed to load input '{}': {e}", path.display()))?
            .into_input(),
        None => RequestInput::new(),
    };
    if let Some(raw) = &args.query {
        request = request.with_query(parse_query_string(raw));
    }

    let outcome = ruleset.evaluate(&mut request);
    tracing::info!(
        rules = %args.rules.display(),
        valid = outcome.is_ok(),
        "Checked request"
    );

    let mut output = Map::new();
    output.insert("valid".to_string(), Value::Bool(outcome.is_ok()));
    if let Err(report) = &outcome {
        let errors = serde_json::to_value(report)
            .map_err(|e| format!("Failed to serialize report: {e}"))?;
        output.insert("errors".to_string(), errors);
    }
    if args.print_input {
        let input = serde_json::to_value(&request)
            .map_err(|e| format!("Failed to serialize input: {e}"))?;
        output.insert("input".to_string(), input);
    }

    print_output(&Value::Object(output), args.format)?;
    Ok(outcome.is_ok())
}

fn parse_query_string(raw: &str) -> ScopeInput {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    ScopeInput::from_pairs(
        Scope::Query,
        url::form_urlencoded::parse(raw.as_bytes()).into_owned(),
    )
}

fn print_output(value: &Value, format: CliOutputFormat) -> Result<(), String> {
    match format {
        CliOutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        CliOutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|e| format!("Failed to serialize output: {e}"))?;
            print!("{yaml}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// lint command
// ---------------------------------------------------------------------------

fn run_lint(args: LintArgs) -> Result<(), String> {
    let mut failed = 0usize;

    for path in &args.rules {
        let config = match RulesetConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                failed += 1;
                continue;
            }
        };

        let errors = config.lint();
        if errors.is_empty() {
            println!(
                "{}: {} query rule(s), {} body rule(s)",
                path.display(),
                config.scope(Scope::Query).map_or(0, <[_]>::len),
                config.scope(Scope::Body).map_or(0, <[_]>::len),
            );
        } else {
            for err in &errors {
                eprintln!("{}: {err}", path.display());
            }
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} of {} rule file(s) failed lint",
            args.rules.len()
        ));
    }
    Ok(())
}
