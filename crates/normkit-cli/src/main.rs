//! normkit CLI.

use clap::{ColorChoice, Parser};
use normkit_cli::commands::{ApplyOptions, apply, builtin_registry, parse_value, unit_rows};
use normkit_cli::logging::{LogConfig, LogFormat, init_logging};
use normkit_cli::summary::{print_units, print_values};
use normkit_model::Value;
use std::io::{self, IsTerminal};
use tracing::error;
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{ApplyArgs, Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let result = match cli.command {
        Command::Units => {
            print_units(&unit_rows(&builtin_registry().current()));
            Ok(())
        }
        Command::Apply(args) => run_apply(args),
    };
    let exit_code = match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let values = args
        .values
        .iter()
        .map(|raw| {
            if args.parse_values {
                parse_value(raw)
            } else {
                Value::from(raw.as_str())
            }
        })
        .collect();
    let options = ApplyOptions {
        on: args.on,
        context: args.context,
    };
    let normalized = apply(builtin_registry(), &args.units, values, &options)?;
    print_values(&normalized, args.json)
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
        .with_timestamps(cli.log_timestamps)
        .with_target(cli.log_target)
        .with_spans(!cli.no_log_spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_flags_reach_the_config() {
        let cli = Cli::parse_from([
            "normkit",
            "--log-timestamps",
            "--log-target",
            "--no-log-spans",
            "--log-format",
            "json",
            "units",
        ]);
        let config = log_config_from_cli(&cli);
        assert!(config.with_timestamps);
        assert!(config.with_target);
        assert!(!config.with_spans);
        assert_eq!(config.format, LogFormat::Json);

        let config = log_config_from_cli(&Cli::parse_from(["normkit", "units"]));
        assert!(!config.with_timestamps);
        assert!(!config.with_target);
        assert!(config.with_spans);
    }
}
