//! Network throughput from successive counter readings.

use crate::metrics::data::{InterfaceCounters, NetworkRate};

/// The previous counter reading of the active interface.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBaseline {
    pub counters: InterfaceCounters,
}

/// Owns the baseline and turns each new reading into a rate.
///
/// The scheduler holds the only instance and calls [`RateCalculator::rate`]
/// once per tick, so the baseline has exactly one mutator.
#[derive(Debug, Default)]
pub struct RateCalculator {
    baseline: Option<RateBaseline>,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline, if one has been established.
    pub fn baseline(&self) -> Option<&RateBaseline> {
        self.baseline.as_ref()
    }

    /// Rate since the previous reading.
    ///
    /// The first reading only establishes the baseline and yields zero. A
    /// missing reading (interface unavailable this tick) yields zero and
    /// clears the baseline so a re-plugged interface starts fresh.
    pub fn rate(&mut self, current: Option<InterfaceCounters>) -> NetworkRate {
        let Some(current) = current else {
            self.baseline = None;
            return NetworkRate::ZERO;
        };

        let rate = match &self.baseline {
            Some(previous) if previous.counters.interface == current.interface => {
                compute_rate(&previous.counters, &current)
            }
            _ => NetworkRate::ZERO,
        };

        self.baseline = Some(RateBaseline { counters: current });
        rate
    }
}

/// Throughput between two readings of the same interface in KB/s.
///
/// Decreasing counters (reset, replaced interface, reboot) clamp to a zero
/// delta. Elapsed time is the real gap between the readings.
pub fn compute_rate(previous: &InterfaceCounters, current: &InterfaceCounters) -> NetworkRate {
    let elapsed = current
        .observed_at
        .saturating_duration_since(previous.observed_at)
        .as_secs_f64();
    if elapsed <= 0.0 {
        return NetworkRate::ZERO;
    }

    let rx = current.received_bytes.saturating_sub(previous.received_bytes);
    let tx = current
        .transmitted_bytes
        .saturating_sub(previous.transmitted_bytes);

    NetworkRate {
        receive_kbps: rx as f64 / elapsed / 1024.0,
        transmit_kbps: tx as f64 / elapsed / 1024.0,
    }
}
