//! alarmctl binary entrypoint.
//!
//! The only place that turns a command outcome into a process exit code.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use alarm_cli::cli::{Cli, Commands};
use alarm_cli::commands::AlarmCommand;
use alarm_cli::{exitcode, ClientError, ClusterClient, CommandError, ContextSource, OutputFormat};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exitcode::BAD_ARGS
            } else {
                exitcode::SUCCESS
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(cli.debug);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::from(exitcode::ERROR);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::from(exitcode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let root = CancellationToken::new();
    let interrupt = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupted, canceling in-flight request");
            interrupt.cancel();
        }
    });

    let contexts = ContextSource::new(root, cli.command_timeout);
    let format = OutputFormat::new(cli.write_out);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Alarm { command } => {
            let mut client = ClusterClient::new(&cli.endpoint, cli.dial_timeout).map_err(
                |e| match e {
                    ClientError::InvalidEndpoint(_) => CommandError::BadArgs(e.to_string()),
                    other => CommandError::Operation(other),
                },
            )?;

            let result = AlarmCommand::new(&mut client, &contexts)
                .execute(&mut stdout, &format, &command)
                .await;
            client.close().await;
            result
        }
    }
}
