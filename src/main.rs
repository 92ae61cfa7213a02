//! runlog - Stream framed remote run logs as a plain byte stream.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use runlog::config::{ConfigError, ConfigLoader, Settings};
use runlog::display;
use runlog::logstream::{
    CompletionOracle, HttpLogSource, LogError, LogReader, LogSource, NeverDone, SessionOutcome,
    StatusOracle,
};
use runlog::transport::{build_http_client, Client, TransportError};

#[derive(Parser)]
#[command(
    name = "runlog",
    about = "Stream framed remote run logs to stdout",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API address, overriding the config file.
    #[arg(long, global = true)]
    address: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a log URL.
    Tail {
        /// Log read URL.
        log_url: Url,
        /// API path whose status ends the stream (e.g. plans/plan-123).
        #[arg(long)]
        status: Option<String>,
    },
    /// Stream the logs of a plan.
    Plan {
        /// Plan ID.
        id: String,
    },
    /// Stream the logs of an apply.
    Apply {
        /// Apply ID.
        id: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Failed to write logs: {0}")]
    Output(std::io::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    cli.config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path)
        .with_address(cli.address.clone())
        .load()
}

/// Cancel `cancel` on Ctrl-C.
fn cancel_on_ctrl_c(cancel: &CancellationToken) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping log stream");
            cancel.cancel();
        }
    });
}

/// Copy a log to stdout until it ends.
async fn stream_to_stdout<S, O>(reader: LogReader<S, O>) -> Result<SessionOutcome, CliError>
where
    S: LogSource + 'static,
    O: CompletionOracle + 'static,
{
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let mut stream = reader.with_cancellation(cancel).open();
    let mut stdout = tokio::io::stdout();
    let copied = tokio::io::copy(&mut stream, &mut stdout).await;
    let _ = stdout.flush().await;

    let outcome = stream
        .close()
        .await
        .unwrap_or(SessionOutcome::Failed(LogError::Aborted));

    match copied {
        Ok(bytes) => {
            tracing::debug!(bytes, "Log copied to stdout");
            Ok(outcome)
        }
        Err(e) if e.get_ref().is_some_and(|inner| inner.is::<LogError>()) => Ok(outcome),
        Err(e) => Err(CliError::Output(e)),
    }
}

async fn run(cli: Cli) -> Result<SessionOutcome, CliError> {
    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Tail { log_url, status } => {
            display::print_session_start(log_url.as_str());
            let oracle: Box<dyn CompletionOracle> = match status {
                Some(path) => {
                    let client = Client::new(&settings.client)?;
                    let terminal: HashSet<String> =
                        settings.status.terminal.iter().cloned().collect();
                    Box::new(StatusOracle::new(client, path, terminal))
                }
                None => Box::new(NeverDone),
            };
            let http = build_http_client(&settings.client)?;
            let source = HttpLogSource::new(http, log_url);
            let reader = LogReader::new(source, oracle).with_config(settings.reader);
            stream_to_stdout(reader).await
        }
        Commands::Plan { id } => stream_resource(&settings, &format!("plans/{id}")).await,
        Commands::Apply { id } => stream_resource(&settings, &format!("applies/{id}")).await,
    }
}

/// Stream the logs of a plan or apply resource.
async fn stream_resource(settings: &Settings, path: &str) -> Result<SessionOutcome, CliError> {
    let client = Client::new(&settings.client)?;
    display::print_session_start(path);
    let reader = client
        .resource_logs(path, &settings.reader, &settings.status)
        .await?;
    stream_to_stdout(reader).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(outcome) => {
            display::print_session_end(&outcome);
            if matches!(outcome, SessionOutcome::Failed(_)) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
