#![forbid(unsafe_code)]

mod adapter;
mod bus;
mod config;
mod constants;
mod dispatch;
mod preference;
mod signal;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;
use tokio::signal::unix::{self as unix_signal, SignalKind};
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;
use zbus::Connection;

use config::Config;
use dispatch::Dispatcher;

/// Themer monitors org.freedesktop.appearance color-scheme over D-Bus and
/// switches the color scheme of the configured applications to match.
#[derive(Parser, Debug)]
#[command(name = "themer", version)]
struct Cli {
    /// Config file to use instead of searching the XDG config directories
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load and validate the config, print the adapters and exit
    #[arg(long)]
    check: bool,

    /// trace, debug, info, warn or error (defaults to $LOG_LEVEL, then info)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn parse_cli() -> Result<Cli> {
    let matches = Cli::command()
        .after_long_help(format!(
            "To use Themer, create a JSON configuration file at \"{}\" that specifies the \
             adapters you want to use along with any necessary parameters.",
            Config::path().display()
        ))
        .get_matches();
    Ok(Cli::from_arg_matches(&matches)?)
}

fn init_logging(requested: Option<&str>) -> Result<()> {
    let log_level = match requested
        .map(str::to_string)
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Resolves with the name of the first termination signal received
async fn shutdown_signal() -> Result<&'static str> {
    let mut terminate =
        unix_signal::signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

fn print_summary(path: &std::path::Path, config: &Config) {
    println!("config: {}", path.display());
    println!("no_preference_fallback: {}", config.no_preference_fallback);
    for (index, adapter) in config.adapters.iter().enumerate() {
        println!("adapter #{index}: {}", adapter.kind());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = parse_cli()?;
    init_logging(cli.log_level.as_deref())?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::locate().context("reading the config file")?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("loading the config file from {}", config_path.display()))?;

    if cli.check {
        print_summary(&config_path, &config);
        return Ok(());
    }

    // Owned here for the whole run; the dispatcher only borrows it for Konsole calls
    let connection = Connection::session()
        .await
        .context("Failed to connect to the D-Bus session bus")?;
    info!(unique_name = ?connection.unique_name(), "connected to session bus");

    let signals = bus::subscribe(&connection).await?;
    let dispatcher = Dispatcher::new(config, connection.clone());

    let result = tokio::select! {
        result = dispatcher.run(signals) => result,
        received = shutdown_signal() => {
            info!(signal = received?, "Shutting down");
            Ok(())
        }
    };

    drop(dispatcher);
    connection
        .close()
        .await
        .context("Failed to close the D-Bus connection")?;
    result
}
