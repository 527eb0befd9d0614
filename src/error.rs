//! Error handling for the resmon sampler.

use std::path::PathBuf;

/// A specialized `Result` type for resmon operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for resmon.
///
/// Only [`MonitorError::Config`] is fatal. Every other variant is raised by a
/// single backend call or sink write and is recovered where it happens.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid flag value, unmounted disk path or similar startup problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single metric could not be read from its backend
    #[error("Failed to read {metric}: {reason}")]
    MetricRead {
        metric: &'static str,
        reason: String,
    },

    /// Backend output did not match its parsing contract
    #[error("Failed to parse backend output: {0}")]
    Parse(String),

    /// An external backend could not be spawned or exited unsuccessfully
    #[error("Command `{program}` failed: {reason}")]
    Command { program: String, reason: String },

    /// The active interface has no counters (unplugged, renamed, ...)
    #[error("Interface {0} is unavailable")]
    InterfaceUnavailable(String),

    /// The log sink could not be written
    #[error("Cannot write log sink {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Background relaunch failed
    #[error("Daemon error: {0}")]
    Daemon(String),
}

impl MonitorError {
    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new metric read error
    pub fn metric_error(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::MetricRead {
            metric,
            reason: reason.into(),
        }
    }

    /// Create a new external command error
    pub fn command_error(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a new daemon error
    pub fn daemon_error(msg: impl Into<String>) -> Self {
        Self::Daemon(msg.into())
    }

    /// Whether this error must stop the process before sampling starts.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Daemon(_))
    }
}
