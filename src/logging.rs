//! Diagnostic logging setup
//!
//! The engine emits `tracing` events (debug for state transitions, warn for
//! recoverable data problems). Binaries call [`init_logging`] once; the
//! `QAREPORT_LOG` environment variable overrides the configured level.

use std::sync::OnceLock;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "QAREPORT_LOG";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the stderr subscriber
pub fn init_logging(level: &str) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOGGING_INITIALIZED.set(());
    Ok(())
}

/// Level implied by the CLI verbosity flags
pub fn level_for(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}
