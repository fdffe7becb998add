use anyhow::{anyhow, Result};
use clap::ValueEnum;
use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, ValueEnum, PartialEq)]
pub enum LogLevel {
    No,
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Option<Level> {
        match self {
            LogLevel::No => None,
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Warning => Some(Level::WARN),
            LogLevel::Error => Some(Level::ERROR),
        }
    }
}

/// Installs the global subscriber. An empty `log_file` logs to stdout,
/// anything else goes to a daily rolling file in the working directory.
pub fn init_logger(
    log_level: LogLevel,
    log_file: String,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let level = log_level
        .to_tracing_level()
        .ok_or_else(|| anyhow!("logging was disabled, no subscriber to install"))?;

    let env_filter = EnvFilter::from_default_env().add_directive(level.as_str().parse()?);

    if !log_file.is_empty() {
        let file_appender = rolling::daily(".", log_file);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_env_filter(env_filter)
            .with_file(false)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;

        //The guard flushes the file writer when dropped
        Ok(Some(guard))
    } else {
        let subscriber = fmt()
            .with_writer(io::stdout)
            .with_env_filter(env_filter)
            .with_file(false)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
        Ok(None)
    }
}
