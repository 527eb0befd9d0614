//! Fixed-cadence sampling loop.
//!
//! The [`Sampler`] owns the platform provider and the rate calculator and
//! drives them one tick at a time. Ticks are scheduled on absolute
//! boundaries (`start + n * interval`) so time spent in backends does not
//! accumulate as drift, and the run ends by wall-clock comparison against the
//! configured duration.

pub mod sink;

use crate::config::SampleConfig;
use crate::metrics::data::MetricSample;
use crate::metrics::rate::RateCalculator;
use crate::metrics::traits::MetricsProvider;
use chrono::Local;
use sink::SinkSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info};

pub use sink::{ConsoleSink, FileSink, SampleSink};

/// Lifecycle of a sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Finished,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured duration elapsed
    DurationElapsed,
    /// The shutdown future resolved between ticks
    Cancelled,
}

/// Summary returned when a run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub samples: u64,
    pub reason: StopReason,
}

/// Drives the provider and rate calculator at a fixed interval.
pub struct Sampler<P> {
    provider: P,
    rates: RateCalculator,
    interface: String,
    disk: PathBuf,
    interval: Duration,
    duration: Option<Duration>,
    state: SchedulerState,
}

impl<P: MetricsProvider> Sampler<P> {
    /// Create a sampler for `config` reporting throughput of `interface`.
    pub fn new(config: &SampleConfig, provider: P, interface: impl Into<String>) -> Self {
        Self {
            provider,
            rates: RateCalculator::new(),
            interface: interface.into(),
            disk: config.disk.clone(),
            interval: config.interval,
            duration: config.duration,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Produce one sample. Metric failures are already folded into zero
    /// values by the provider, so a tick always yields a sample.
    pub async fn tick(&mut self) -> MetricSample {
        let timestamp = Local::now();
        let reading = self.provider.sample(&self.disk, &self.interface).await;
        let rate = self.rates.rate(reading.counters.clone());
        MetricSample::from_reading(
            timestamp,
            &reading,
            rate,
            self.disk.to_string_lossy(),
            self.interface.as_str(),
        )
    }

    /// Run until the duration elapses or `shutdown` resolves.
    ///
    /// `shutdown` is only observed while waiting for the next tick boundary,
    /// so a cancelled run never leaves a half-written line behind. All sinks
    /// are flushed before returning.
    pub async fn run<F>(&mut self, sinks: &mut SinkSet, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let start = Instant::now();
        let mut next_tick = start;
        let mut samples = 0_u64;
        self.state = SchedulerState::Running;
        info!(
            interface = %self.interface,
            interval_secs = self.interval.as_secs_f64(),
            "sampling started"
        );

        let reason = loop {
            if let Some(duration) = self.duration {
                if start.elapsed() >= duration {
                    break StopReason::DurationElapsed;
                }
            }

            let sample = self.tick().await;
            sinks.write_sample(&sample);
            samples += 1;

            next_tick += self.interval;
            let now = Instant::now();
            if next_tick < now {
                debug!(
                    behind_ms = (now - next_tick).as_millis() as u64,
                    "tick overran its interval"
                );
            }

            tokio::select! {
                _ = time::sleep_until(next_tick) => {}
                _ = &mut shutdown => break StopReason::Cancelled,
            }
        };

        self.state = SchedulerState::Finished;
        sinks.flush();
        info!(samples, ?reason, "sampling finished");

        RunSummary { samples, reason }
    }
}
