//! Traits for platform metric collection.

use crate::error::Result;
use crate::metrics::data::{clamp_memory, clamp_percent, InterfaceCounters, ProviderReading};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

/// Capability interface implemented by every platform backend.
///
/// Implementations return raw (unclamped) values and typed errors. The
/// provided [`MetricsProvider::sample`] turns a failed metric into its zero
/// value and a warning, so one dark signal never stops a tick.
#[async_trait]
pub trait MetricsProvider: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// CPU busy percentage.
    async fn cpu_usage(&mut self) -> Result<f64>;

    /// Used memory percentage.
    async fn memory_usage(&mut self) -> Result<f64>;

    /// Capacity percentage of the filesystem holding `path`.
    async fn disk_usage(&mut self, path: &Path) -> Result<f64>;

    /// Cumulative byte counters of `interface`.
    async fn interface_counters(&mut self, interface: &str) -> Result<InterfaceCounters>;

    /// Read all four capabilities for one tick.
    async fn sample(&mut self, disk: &Path, interface: &str) -> ProviderReading {
        let cpu_percent = match self.cpu_usage().await {
            Ok(value) => clamp_percent(value),
            Err(err) => {
                warn!(metric = "cpu", backend = self.name(), "{err}; reporting 0");
                0
            }
        };

        let memory_percent = match self.memory_usage().await {
            Ok(value) => clamp_memory(value),
            Err(err) => {
                warn!(metric = "memory", backend = self.name(), "{err}; reporting 0.0");
                0.0
            }
        };

        let disk_percent = match self.disk_usage(disk).await {
            Ok(value) => clamp_percent(value),
            Err(err) => {
                warn!(metric = "disk", backend = self.name(), path = %disk.display(), "{err}; reporting 0");
                0
            }
        };

        let counters = match self.interface_counters(interface).await {
            Ok(counters) => Some(counters),
            Err(err) => {
                warn!(metric = "network", backend = self.name(), interface, "{err}; reporting zero rates");
                None
            }
        };

        ProviderReading {
            cpu_percent,
            memory_percent,
            disk_percent,
            counters,
        }
    }
}

#[async_trait]
impl<P: MetricsProvider + ?Sized> MetricsProvider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn cpu_usage(&mut self) -> Result<f64> {
        (**self).cpu_usage().await
    }

    async fn memory_usage(&mut self) -> Result<f64> {
        (**self).memory_usage().await
    }

    async fn disk_usage(&mut self, path: &Path) -> Result<f64> {
        (**self).disk_usage(path).await
    }

    async fn interface_counters(&mut self, interface: &str) -> Result<InterfaceCounters> {
        (**self).interface_counters(interface).await
    }

    async fn sample(&mut self, disk: &Path, interface: &str) -> ProviderReading {
        (**self).sample(disk, interface).await
    }
}
