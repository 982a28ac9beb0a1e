#![forbid(unsafe_code)]

mod actions;
mod color;
mod config;
mod constants;
mod coordinator;
mod daemon;
mod display;
mod geometry;
mod ipc;
mod overlay;
mod pointer;
mod scheduler;
mod trigger_zone;
mod x11;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use config::Config;
use constants::timing;
use ipc::{ControlClient, ControlRequest, ControlResponse};

/// Hover the top-center of a display to reveal a workspace switcher panel
#[derive(Parser, Debug)]
#[command(name = "notch-switch", version)]
struct Cli {
    /// Config file (default: XDG config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Control socket (default: XDG runtime dir)
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the overlay daemon (default)
    Run,
    /// Show the overlay once on the primary display
    ShowOnce {
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },
    /// Hide the overlay right away
    Hide,
    /// Change hover delays on the running daemon
    SetDelays {
        #[arg(long, value_name = "MS", allow_negative_numbers = true)]
        show_ms: f64,
        #[arg(long, value_name = "MS", allow_negative_numbers = true)]
        hide_ms: f64,
    },
    /// Print the daemon's overlay state
    Status,
    /// Check that the daemon answers
    Ping,
    /// Stop the daemon
    Shutdown,
}

fn parse_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn init_logging(cli_level: Option<&str>) -> Result<()> {
    let level = match cli_level {
        Some(level) => parse_level(level),
        None => parse_level(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())),
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")?;
    Ok(())
}

fn send(socket: &std::path::Path, request: ControlRequest) -> Result<ControlResponse> {
    let mut client = ControlClient::connect_to(socket)?;
    client.set_timeout(Duration::from_millis(timing::IPC_REPLY_TIMEOUT_MS * 2))?;
    client.request(&request)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let socket = match cli.socket {
        Some(path) => path,
        None => ipc::default_socket_path()?,
    };

    let request = match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config_path = cli.config.unwrap_or_else(Config::default_path);
            info!(config = %config_path.display(), "Starting notch-switch daemon");
            return daemon::run_daemon(&config_path, socket);
        }
        Command::ShowOnce { duration_ms } => ControlRequest::ShowOnce { duration_ms },
        Command::Hide => ControlRequest::Hide,
        Command::SetDelays { show_ms, hide_ms } => ControlRequest::UpdateDelays { show_ms, hide_ms },
        Command::Status => ControlRequest::Status,
        Command::Ping => ControlRequest::Ping,
        Command::Shutdown => ControlRequest::Shutdown,
    };

    match send(&socket, request)? {
        ControlResponse::Ready => Ok(()),
        ControlResponse::Pong => {
            println!("pong");
            Ok(())
        }
        ControlResponse::Status {
            phase,
            visible,
            display,
            show_delay_ms,
            hide_delay_ms,
        } => {
            println!("phase:   {phase:?}");
            println!("visible: {visible}");
            println!("display: {}", display.as_deref().unwrap_or("-"));
            println!("delays:  show {show_delay_ms}ms, hide {hide_delay_ms}ms");
            Ok(())
        }
        ControlResponse::Error(message) => anyhow::bail!("daemon: {message}"),
    }
}
