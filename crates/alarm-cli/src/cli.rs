//! Command-line argument parsing with clap.
//!
//! Subcommand arguments are collected as raw strings; their count and format
//! are checked by the command handlers, so that every malformed invocation
//! is reported the same way.

use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Default cluster endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:2379";

/// alarmctl - cluster alarm administration.
#[derive(Parser, Debug, Clone)]
#[command(name = "alarmctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Cluster endpoint to connect to.
    #[arg(
        short,
        long,
        global = true,
        env = "ALARMCTL_ENDPOINT",
        default_value = DEFAULT_ENDPOINT
    )]
    pub endpoint: String,

    /// Timeout for each cluster request (e.g. 5s, 500ms, 1m30s).
    #[arg(
        long,
        global = true,
        env = "ALARMCTL_COMMAND_TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration
    )]
    pub command_timeout: Duration,

    /// Timeout for establishing a connection.
    #[arg(
        long,
        global = true,
        env = "ALARMCTL_DIAL_TIMEOUT",
        default_value = "2s",
        value_parser = parse_duration
    )]
    pub dial_timeout: Duration,

    /// Output format.
    #[arg(
        short = 'w',
        long,
        global = true,
        value_enum,
        env = "ALARMCTL_WRITE_OUT",
        default_value_t = Format::Simple
    )]
    pub write_out: Format,

    /// Increase log verbosity (-d info, -dd debug, -ddd trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// One line per record.
    #[default]
    Simple,
    /// Human-readable table format.
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Alarm related commands.
    Alarm {
        /// Alarm subcommand to execute.
        #[command(subcommand)]
        command: AlarmCommands,
    },
}

/// Alarm subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AlarmCommands {
    /// Arms an alarm.
    #[command(override_usage = "alarmctl alarm arm <memberID> <alarmType>")]
    Arm {
        /// Member ID (hex) followed by the alarm type.
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Disarms all alarms.
    #[command(override_usage = "alarmctl alarm disarm")]
    Disarm {
        /// Not accepted.
        #[arg(value_name = "ARGS", hide = true)]
        args: Vec<String>,
    },

    /// Lists all alarms.
    #[command(override_usage = "alarmctl alarm list")]
    List {
        /// Not accepted.
        #[arg(value_name = "ARGS", hide = true)]
        args: Vec<String>,
    },
}

/// Parse durations such as `500ms`, `5s`, `2m` or `1h30m`.
///
/// # Errors
///
/// Returns a message if the input is empty, has a missing or unknown unit,
/// overflows, or adds up to zero.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".into());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration '{input}': expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration '{input}': {e}"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "" => return Err(format!("invalid duration '{input}': missing unit")),
            unit => return Err(format!("invalid duration '{input}': unknown unit '{unit}'")),
        };
        rest = &rest[unit_len..];

        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("invalid duration '{input}': too large"))?;
    }

    if total.is_zero() {
        return Err(format!("invalid duration '{input}': must be positive"));
    }
    Ok(total)
}
