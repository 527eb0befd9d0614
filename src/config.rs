//! Sampling configuration.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one sampling run.
///
/// Built once from the command line and never mutated after
/// [`SampleConfig::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Total run length; `None` runs until the process is signalled
    pub duration: Option<Duration>,
    /// Time between two ticks
    pub interval: Duration,
    /// Path whose filesystem usage is reported
    pub disk: PathBuf,
    /// Explicit network interface, `None` to auto-detect
    pub interface: Option<String>,
    /// Log sink path, `None` for console-only output
    pub output: Option<PathBuf>,
    /// Relaunch detached from the terminal
    pub daemon: bool,
    /// Colorize console lines
    pub color: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            duration: Some(Duration::from_secs(crate::DEFAULT_DURATION_SECS)),
            interval: Duration::from_secs(crate::DEFAULT_INTERVAL_SECS),
            disk: PathBuf::from(crate::DEFAULT_DISK_PATH),
            interface: None,
            output: None,
            daemon: false,
            color: true,
        }
    }
}

impl SampleConfig {
    /// Create a configuration with the given duration and interval in seconds.
    pub fn new(duration_secs: u64, interval_secs: u64) -> Self {
        Self {
            duration: Some(Duration::from_secs(duration_secs)),
            interval: Duration::from_secs(interval_secs),
            ..Default::default()
        }
    }

    /// Set the total run length. `None` means unbounded.
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Set the sampling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the monitored disk path.
    pub fn with_disk(mut self, disk: impl Into<PathBuf>) -> Self {
        self.disk = disk.into();
        self
    }

    /// Set the explicit interface. Empty names mean auto-detect.
    pub fn with_interface(mut self, interface: Option<String>) -> Self {
        self.interface = interface.filter(|name| !name.trim().is_empty());
        self
    }

    /// Set the log sink path. Empty paths mean console-only.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output.filter(|path| !path.as_os_str().is_empty());
        self
    }

    /// Enable or disable daemon mode.
    pub fn with_daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    /// Enable or disable console colors.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Check the invariants that must hold before any sampling starts.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MonitorError::config_error(
                "--interval must be a positive number of seconds",
            ));
        }

        if let Some(duration) = self.duration {
            if duration.is_zero() {
                return Err(MonitorError::config_error(
                    "--duration must be a positive number of seconds",
                ));
            }
            if self.interval > duration {
                return Err(MonitorError::config_error(format!(
                    "--interval ({}s) must not exceed --duration ({}s)",
                    self.interval.as_secs(),
                    duration.as_secs()
                )));
            }
        }

        if !self.disk.exists() {
            return Err(MonitorError::config_error(format!(
                "disk path {} does not exist",
                self.disk.display()
            )));
        }

        Ok(())
    }

    /// Number of ticks a bounded run produces, `None` when unbounded.
    pub fn expected_ticks(&self) -> Option<u64> {
        let duration = self.duration?;
        let interval = self.interval.as_millis().max(1);
        Some(duration.as_millis().div_ceil(interval) as u64)
    }
}
