//! Data structures for sampled metrics.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use tokio::time::Instant;

/// Timestamp layout used at the start of every output line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cumulative byte counters of one interface at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceCounters {
    /// Interface name (e.g., "eth0", "wlan0", "en0")
    pub interface: String,
    /// Cumulative received bytes
    pub received_bytes: u64,
    /// Cumulative transmitted bytes
    pub transmitted_bytes: u64,
    /// When the counters were read
    pub observed_at: Instant,
}

impl InterfaceCounters {
    /// Create counters observed right now.
    pub fn new(interface: impl Into<String>, received_bytes: u64, transmitted_bytes: u64) -> Self {
        Self::observed(interface, received_bytes, transmitted_bytes, Instant::now())
    }

    /// Create counters observed at a given instant.
    pub fn observed(
        interface: impl Into<String>,
        received_bytes: u64,
        transmitted_bytes: u64,
        observed_at: Instant,
    ) -> Self {
        Self {
            interface: interface.into(),
            received_bytes,
            transmitted_bytes,
            observed_at,
        }
    }
}

/// Receive and transmit throughput in kilobytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NetworkRate {
    pub receive_kbps: f64,
    pub transmit_kbps: f64,
}

impl NetworkRate {
    pub const ZERO: NetworkRate = NetworkRate {
        receive_kbps: 0.0,
        transmit_kbps: 0.0,
    };
}

/// Raw readings of one tick, already clamped by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReading {
    pub cpu_percent: u8,
    pub memory_percent: f64,
    pub disk_percent: u8,
    /// `None` when the active interface could not be read this tick
    pub counters: Option<InterfaceCounters>,
}

/// One output record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// Local wall-clock time of the tick
    pub timestamp: DateTime<Local>,
    /// CPU busy percentage (0 to 100)
    pub cpu_percent: u8,
    /// Memory usage percentage (0.0 to 100.0, one decimal)
    pub memory_percent: f64,
    /// Filesystem usage percentage of the monitored path (0 to 100)
    pub disk_percent: u8,
    /// Monitored path as given on the command line
    pub disk_path: String,
    /// Active interface
    pub interface: String,
    /// Receive throughput in KB/s (one decimal)
    pub receive_kbps: f64,
    /// Transmit throughput in KB/s (one decimal)
    pub transmit_kbps: f64,
}

impl MetricSample {
    /// Build a sample from one tick's provider reading and computed rate.
    pub fn from_reading(
        timestamp: DateTime<Local>,
        reading: &ProviderReading,
        rate: NetworkRate,
        disk_path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            cpu_percent: reading.cpu_percent.min(100),
            memory_percent: clamp_memory(reading.memory_percent),
            disk_percent: reading.disk_percent.min(100),
            disk_path: disk_path.into(),
            interface: interface.into(),
            receive_kbps: round_tenth(rate.receive_kbps.max(0.0)),
            transmit_kbps: round_tenth(rate.transmit_kbps.max(0.0)),
        }
    }

    /// Formatted timestamp prefix without brackets.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] CPU: {:>3}% | MEM: {:>5.1}% | DISK({}): {:>3}% | NET({}) RX: {:>5.1}KB/s | TX: {:>5.1}KB/s",
            self.timestamp_string(),
            self.cpu_percent,
            self.memory_percent,
            self.disk_path,
            self.disk_percent,
            self.interface,
            self.receive_kbps,
            self.transmit_kbps
        )
    }
}

/// Round and clamp a percentage to a whole number in `0..=100`.
pub fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Clamp a memory percentage to `0.0..=100.0` with one decimal.
pub fn clamp_memory(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    round_tenth(value.clamp(0.0, 100.0))
}

/// Round to one decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
