mod load;

use std::path::{Path, PathBuf};

use argtree_core::{CommandSpec, ParserConfig};
use argtree_parser::{ParseError, Parser as ArgParser, expand_args};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::load::{load_config, load_spec};

/// Output format for result trees.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argtree", version)]
#[command(about = "Specification-driven command-line parsing")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a specification file against a configuration.
    Validate(ValidateArgs),
    /// Expand argument files and print the resulting arguments.
    Expand(ExpandArgs),
    /// Parse arguments against a specification and print the result tree.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Specification file (JSON, or YAML by extension).
    spec: PathBuf,

    /// Parser configuration file (JSON, or YAML by extension).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExpandArgs {
    /// Parser configuration file (JSON, or YAML by extension).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Arguments to expand; put them after `--` when they look like options.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Specification file (JSON, or YAML by extension).
    spec: PathBuf,

    /// Parser configuration file (JSON, or YAML by extension).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: CliOutputFormat,

    /// Skip argument-file expansion.
    #[arg(long)]
    no_argfiles: bool,

    /// Arguments to parse, excluding the program name; put them after `--`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Expand(args) => run_expand(args),
        Command::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let (spec, config) = load_inputs(&args.spec, args.config.as_deref())?;
    ArgParser::new(&spec, &config).map_err(|e| format!("{}: {e}", args.spec.display()))?;

    let counts = count_levels(&spec);
    println!(
        "OK: '{}' ({} commands, {} options, {} positionals)",
        spec.name(),
        counts.commands,
        counts.options,
        counts.positionals
    );
    Ok(())
}

fn run_expand(args: ExpandArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref()).map_err(|e| e.to_string())?;
    let expanded = expand_args(&args.args, &config).map_err(|e| describe_parse_error(&e))?;
    debug!(given = args.args.len(), expanded = expanded.len(), "Expanded arguments");
    for arg in expanded {
        println!("{arg}");
    }
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let (spec, config) = load_inputs(&args.spec, args.config.as_deref())?;
    let parser =
        ArgParser::new(&spec, &config).map_err(|e| format!("{}: {e}", args.spec.display()))?;

    let result = if args.no_argfiles {
        parser.parse_expanded(&args.args)
    } else {
        parser.parse(args.args)
    }
    .map_err(|e| describe_parse_error(&e))?;

    print_output(&result, args.format)
}

fn load_inputs(spec: &Path, config: Option<&Path>) -> Result<(CommandSpec, ParserConfig), String> {
    let def = load_spec(spec).map_err(|e| format!("{}: {e}", spec.display()))?;
    let spec = def
        .build()
        .map_err(|e| format!("{}: {e}", spec.display()))?;
    let config = load_config(config).map_err(|e| e.to_string())?;
    Ok((spec, config))
}

fn describe_parse_error(err: &ParseError) -> String {
    let mut message = err.to_string();
    if let Some(token) = err.token() {
        message.push_str(&format!("\n  token: {token}"));
    }
    if !err.command_path.is_empty() {
        message.push_str(&format!("\n  command: {}", err.command_path.join(" ")));
    }
    message
}

fn print_output<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize output: {e}"))?,
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize output: {e}"))?
        }
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct LevelCounts {
    commands: usize,
    options: usize,
    positionals: usize,
}

fn count_levels(spec: &CommandSpec) -> LevelCounts {
    let mut counts = LevelCounts {
        commands: 1,
        options: spec.options().len(),
        positionals: spec.positionals().len(),
    };
    for child in spec.subcommands() {
        let nested = count_levels(child);
        counts.commands += nested.commands;
        counts.options += nested.options;
        counts.positionals += nested.positionals;
    }
    counts
}
