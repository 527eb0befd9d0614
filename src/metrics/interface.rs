//! Active network interface selection.

use crate::error::{MonitorError, Result};
use crate::metrics::collector::Platform;
use std::collections::HashMap;
use std::time::Duration;
use sysinfo::Networks;
use tokio::time;
use tracing::{debug, info, warn};

/// Window over which interface activity is observed during auto-detection.
pub const ACTIVITY_WINDOW: Duration = Duration::from_secs(1);

/// Wired, wireless and bonded name prefixes considered by auto-detection.
const CANDIDATE_PREFIXES: [&str; 6] = ["eth", "en", "wlan", "wl", "bond", "usb"];

/// Resolves the interface reported by every sample. Runs once at startup.
pub struct InterfaceSelector {
    platform: Platform,
    networks: Networks,
}

impl InterfaceSelector {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// Names of all interfaces currently known to the system.
    pub fn available(&self) -> Vec<String> {
        self.networks.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Resolve the interface to report.
    ///
    /// An explicit name is taken verbatim when it exists, otherwise the first
    /// existing platform default replaces it. Fails with a configuration
    /// error only when neither exists. Without an explicit name the most
    /// active candidate over [`ACTIVITY_WINDOW`] wins, then the platform
    /// default, and resolution never fails.
    pub async fn resolve(&mut self, explicit: Option<&str>) -> Result<String> {
        let available = self.available();

        if let Some(name) = explicit.filter(|name| !name.is_empty()) {
            return resolve_explicit(self.platform, name, &available);
        }

        let before = self.candidate_totals();
        time::sleep(ACTIVITY_WINDOW).await;
        self.networks.refresh();
        let after = self.candidate_totals();

        match pick_most_active(&before, &after) {
            Some(name) => {
                info!(interface = %name, "auto-detected active interface");
                Ok(name)
            }
            None => {
                debug!("no candidate interface showed traffic");
                Ok(fallback(self.platform, &available))
            }
        }
    }

    fn candidate_totals(&self) -> HashMap<String, u64> {
        self.networks
            .iter()
            .filter(|(name, _)| is_candidate(name))
            .map(|(name, data)| {
                let total = data.total_received().saturating_add(data.total_transmitted());
                (name.clone(), total)
            })
            .collect()
    }
}

/// Whether `name` looks like a physical or bonded interface.
pub fn is_candidate(name: &str) -> bool {
    if name == "lo" || name.starts_with("lo0") {
        return false;
    }
    CANDIDATE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Interface with the largest combined rx+tx growth between two snapshots
/// of cumulative totals. `None` when nothing moved.
pub fn pick_most_active(
    before: &HashMap<String, u64>,
    after: &HashMap<String, u64>,
) -> Option<String> {
    after
        .iter()
        .filter(|(name, _)| is_candidate(name))
        .map(|(name, total)| {
            let previous = before.get(name).copied().unwrap_or(*total);
            (name, total.saturating_sub(previous))
        })
        .filter(|(_, delta)| *delta > 0)
        .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
        .map(|(name, _)| name.clone())
}

/// Verify an explicitly configured interface, substituting an existing
/// platform default when it is absent.
pub fn resolve_explicit(platform: Platform, name: &str, available: &[String]) -> Result<String> {
    if available.iter().any(|candidate| candidate == name) {
        debug!(interface = name, "using configured interface");
        return Ok(name.to_string());
    }

    match existing_default(platform, available) {
        Some(default) => {
            warn!(
                interface = name,
                fallback = %default,
                "configured interface not found, falling back to default"
            );
            Ok(default)
        }
        None => Err(MonitorError::config_error(format!(
            "interface {name} not found and no default interface ({}) exists",
            platform.default_interfaces().join(", ")
        ))),
    }
}

/// First platform default present in `available`.
pub fn existing_default(platform: Platform, available: &[String]) -> Option<String> {
    platform
        .default_interfaces()
        .iter()
        .find(|name| available.iter().any(|candidate| candidate == *name))
        .map(|name| name.to_string())
}

/// First platform default that exists, or the preferred one with a warning.
pub fn fallback(platform: Platform, available: &[String]) -> String {
    if let Some(found) = existing_default(platform, available) {
        return found;
    }

    let preferred = platform.default_interfaces()[0];
    warn!(interface = preferred, "default interface does not exist; rates will read zero");
    preferred.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries.iter().map(|(n, t)| (n.to_string(), *t)).collect()
    }

    #[test]
    fn test_candidate_patterns() {
        for name in ["eth0", "enp3s0", "en0", "wlan0", "wlp2s0", "bond0"] {
            assert!(is_candidate(name), "{name} should be a candidate");
        }
        for name in ["lo", "lo0", "docker0", "veth12ab", "br-1234", "tun0"] {
            assert!(!is_candidate(name), "{name} should be ignored");
        }
    }

    #[test]
    fn test_pick_most_active() {
        let before = totals(&[("eth0", 1_000), ("wlan0", 5_000), ("lo", 0)]);
        let after = totals(&[("eth0", 1_500), ("wlan0", 9_000), ("lo", 1_000_000)]);
        assert_eq!(pick_most_active(&before, &after), Some("wlan0".to_string()));
    }

    #[test]
    fn test_pick_most_active_without_traffic() {
        let before = totals(&[("eth0", 1_000), ("wlan0", 5_000)]);
        assert_eq!(pick_most_active(&before, &before), None);
    }

    #[test]
    fn test_new_interface_is_not_counted_from_zero() {
        let before = totals(&[("eth0", 1_000)]);
        let after = totals(&[("eth0", 1_100), ("wlan0", 50_000_000)]);
        assert_eq!(pick_most_active(&before, &after), Some("eth0".to_string()));
    }

    #[test]
    fn test_fallback_prefers_existing_default() {
        let available = vec!["lo".to_string(), "wlan0".to_string()];
        assert_eq!(fallback(Platform::Procfs, &available), "wlan0");
        assert_eq!(fallback(Platform::Constrained, &available), "wlan0");
    }

    #[test]
    fn test_fallback_without_any_default() {
        let available = vec!["lo".to_string()];
        assert_eq!(fallback(Platform::Procfs, &available), "eth0");
        assert_eq!(fallback(Platform::KernelStats, &available), "en0");
    }

    #[test]
    fn test_explicit_interface_taken_verbatim() {
        let available = vec!["lo".to_string(), "enp3s0".to_string()];
        let resolved = resolve_explicit(Platform::Procfs, "enp3s0", &available).unwrap();
        assert_eq!(resolved, "enp3s0");
    }

    #[test]
    fn test_unknown_explicit_interface_falls_back() {
        let available = vec!["lo".to_string(), "wlan0".to_string()];
        let resolved = resolve_explicit(Platform::Procfs, "eth9", &available).unwrap();
        assert_eq!(resolved, "wlan0");
    }

    #[test]
    fn test_unknown_explicit_interface_without_default_is_fatal() {
        let available = vec!["lo".to_string(), "enp3s0".to_string()];
        let err = resolve_explicit(Platform::Procfs, "eth9", &available).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("eth9"));
    }

    #[tokio::test]
    async fn test_selector_explicit_resolution_matches_host() {
        let mut selector = InterfaceSelector::new(Platform::Procfs);
        let has_default = existing_default(Platform::Procfs, &selector.available()).is_some();

        match selector.resolve(Some("eth9-resmon")).await {
            Ok(resolved) => {
                assert!(has_default);
                assert!(Platform::Procfs.default_interfaces().contains(&resolved.as_str()));
            }
            Err(err) => {
                assert!(!has_default);
                assert!(err.is_config());
            }
        }
    }
}
