//! SAMI - terminal client for the SAMI operations-monitoring backend.
//!
//! Restores the previous session on startup, runs one command, and treats
//! a session expiry reported during that command as a sign-in prompt.

mod args;
mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use sami_core::{ApiClient, Config, SessionEvent, SessionStore};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Command, USAGE};
use commands::Outcome;

/// Directory for the optional daily log file
const LOG_DIR_ENV: &str = "SAMI_LOG_DIR";

/// File name prefix for daily log files
const LOG_FILE_PREFIX: &str = "sami.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=sami_core=debug).
/// The returned guard flushes the file log and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            return Ok(ExitCode::from(2));
        }
    };

    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load()?;
    let storage = config.token_storage()?;
    let api = ApiClient::new(config.api_url(), storage)?;
    let session = SessionStore::new(api);
    info!(api_url = %session.api().base_url(), "SAMI client starting");

    // A stale token found here is just discarded, not reported as expiry
    if session.restore().await {
        debug!("Previous session restored");
    }
    let mut events = session.subscribe();

    let result = run(&command, &session, &mut config, &mut events).await;

    let session_expired = matches!(result, Ok(Outcome::SessionExpired))
        || (command.reports_expiry() && expired(&mut events));
    if session_expired {
        eprintln!("Session expired. Please log in again.");
        return Ok(ExitCode::FAILURE);
    }

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(
    command: &Command,
    session: &SessionStore,
    config: &mut Config,
    events: &mut broadcast::Receiver<SessionEvent>,
) -> Result<Outcome> {
    let done = |result: Result<()>| result.map(|()| Outcome::Done);

    match command {
        Command::Login { email } => done(commands::login(session, config, email.clone()).await),
        Command::Logout => done(commands::logout(session).await),
        Command::WhoAmI => done(commands::whoami(session).await),
        Command::Status => done(commands::status(session).await),
        Command::Health => done(commands::health(session).await),
        Command::Dashboard => done(commands::show_dashboard(session).await),
        Command::Watch { interval } => {
            let interval = interval.unwrap_or_else(|| config.poll_interval());
            commands::watch(session, events, interval).await
        }
        Command::Get { target, params } => {
            done(commands::get(session, *target, params.clone()).await)
        }
        Command::Help => {
            println!("{}", USAGE);
            Ok(Outcome::Done)
        }
    }
}

/// Whether an `Expired` event is waiting on the channel
fn expired(events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Expired) => return true,
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return false,
        }
    }
}
