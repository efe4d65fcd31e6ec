//! CLI argument definitions for the `normkit` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use normkit_cli::commands::UnitSpec;

#[derive(Parser)]
#[command(
    name = "normkit",
    version,
    about = "Inspect and apply composable value normalizations",
    long_about = "Inspect the built-in capabilities and run values through a chain of them.\n\n\
                  Units compose left to right, exactly as `a | b | c` does in code."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include timestamps in pretty and compact log lines.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Include the module path of each event.
    #[arg(long = "log-target", global = true)]
    pub log_target: bool,

    /// Do not emit span close events in JSON logs.
    #[arg(long = "no-log-spans", global = true)]
    pub no_log_spans: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the capabilities of the built-in providers.
    Units,

    /// Normalize values through a chain of units.
    Apply(ApplyArgs),
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Unit to apply, as NAME or NAME=ARG[,ARG...]. Repeat to compose.
    #[arg(long = "unit", short = 'u', value_name = "UNIT", required = true)]
    pub units: Vec<UnitSpec>,

    /// Restrict the rule to this context tag.
    #[arg(long = "on", value_name = "TAG")]
    pub on: Option<String>,

    /// Normalize under this context.
    #[arg(long = "context", value_name = "TAG")]
    pub context: Option<String>,

    /// Parse each VALUE as JSON, falling back to a plain string.
    #[arg(long = "parse-values")]
    pub parse_values: bool,

    /// Print the results as a JSON array.
    #[arg(long = "json")]
    pub json: bool,

    /// Values to normalize.
    #[arg(value_name = "VALUE", required = true)]
    pub values: Vec<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
