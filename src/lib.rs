//! # resmon - continuous system resource sampler
//!
//! Samples CPU, memory, disk and network utilization at a fixed cadence and
//! writes one uniform line per tick to the console and, optionally, an
//! append-only log file.
//!
//! ## Features
//!
//! - **One record, many backends**: Darwin kernel statistics, Linux procfs and
//!   ARM single-board quirks behind a single [`MetricsProvider`] trait
//! - **Delta-based throughput**: receive/transmit KB/s from cumulative counters
//! - **Interface auto-detection**: the busiest wired, wireless or bonded link
//! - **Drift-free scheduling**: ticks land on absolute interval boundaries
//! - **Daemon mode**: relaunch detached from the terminal with a default log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resmon::{provider_for, InterfaceSelector, Platform, SampleConfig, Sampler};
//! use resmon::sampler::{ConsoleSink, sink::SinkSet};
//!
//! #[tokio::main]
//! async fn main() -> resmon::Result<()> {
//!     let config = SampleConfig::new(10, 2);
//!     let platform = Platform::detect();
//!     let interface = InterfaceSelector::new(platform).resolve(None).await?;
//!
//!     let mut sinks = SinkSet::new().with_sink(ConsoleSink::new(true));
//!     let mut sampler = Sampler::new(&config, provider_for(platform), interface);
//!     sampler.run(&mut sinks, std::future::pending()).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod metrics;
pub mod sampler;

// Re-export public API
pub use config::SampleConfig;
pub use error::{MonitorError, Result};
pub use metrics::{
    collector::{provider_for, verify_mounted, Platform},
    data::{InterfaceCounters, MetricSample, NetworkRate},
    interface::InterfaceSelector,
    rate::{RateBaseline, RateCalculator},
    traits::MetricsProvider,
};
pub use sampler::{RunSummary, Sampler, SchedulerState, StopReason};

/// The default total run length in seconds
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// The default sampling interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// The default monitored filesystem path
pub const DEFAULT_DISK_PATH: &str = "/";
