//! Platform metric collection.
//!
//! This module normalizes CPU, memory, disk and network readings from the
//! host's native backends into one record, computes network throughput from
//! successive counters, and picks the interface worth reporting.

pub mod collector;
pub mod data;
pub mod interface;
pub mod parse;
pub mod rate;
pub mod traits;

// Re-export commonly used items
pub use collector::{provider_for, Platform};
pub use data::{InterfaceCounters, MetricSample, NetworkRate};
pub use interface::InterfaceSelector;
pub use rate::{RateBaseline, RateCalculator};
pub use traits::MetricsProvider;
