//! Platform metric collectors backed by external utilities and procfs.

use crate::error::{MonitorError, Result};
use crate::metrics::data::InterfaceCounters;
use crate::metrics::parse;
use crate::metrics::traits::MetricsProvider;
use async_trait::async_trait;
use std::fs;
use std::future::Future;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

const DEVICE_TREE_MODEL_PATHS: [&str; 2] = [
    "/proc/device-tree/model",
    "/sys/firmware/devicetree/base/model",
];

/// Backend family serving the current host. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Darwin-style kernel statistics (`top -l`, `vm_stat`, `netstat -ib`)
    KernelStats,
    /// Linux procfs and procps utilities
    Procfs,
    /// ARM single-board computers (Raspberry Pi and similar)
    Constrained,
}

impl Platform {
    /// Probe the running system.
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            return Platform::KernelStats;
        }

        match read_device_model() {
            Some(model) => Self::from_device_model(&model),
            None => Platform::Procfs,
        }
    }

    /// Classify a device-tree model string.
    pub fn from_device_model(model: &str) -> Self {
        let model = model.trim_matches(char::from(0)).trim();
        let is_arm = cfg!(any(target_arch = "arm", target_arch = "aarch64"));
        if model.contains("Raspberry Pi") || (is_arm && !model.is_empty()) {
            Platform::Constrained
        } else {
            Platform::Procfs
        }
    }

    /// Fallback interfaces in preference order when auto-detection finds no
    /// traffic: wireless first on constrained devices, wired first otherwise.
    pub fn default_interfaces(&self) -> &'static [&'static str] {
        match self {
            Platform::KernelStats => &["en0", "en1"],
            Platform::Procfs => &["eth0", "wlan0"],
            Platform::Constrained => &["wlan0", "eth0"],
        }
    }
}

fn read_device_model() -> Option<String> {
    DEVICE_TREE_MODEL_PATHS
        .iter()
        .find_map(|path| fs::read_to_string(path).ok())
}

/// Build the collector for `platform`.
pub fn provider_for(platform: Platform) -> Box<dyn MetricsProvider> {
    match platform {
        Platform::KernelStats => Box::new(KernelStatsCollector::new()),
        Platform::Procfs => Box::new(ProcfsCollector::new()),
        Platform::Constrained => Box::new(ConstrainedCollector::new()),
    }
}

/// Fail unless `path` lies on a currently mounted filesystem.
pub async fn verify_mounted(path: &Path) -> Result<()> {
    df_capacity(path).await.map(|_| ()).map_err(|err| {
        MonitorError::config_error(format!("{} is not a mounted path: {err}", path.display()))
    })
}

/// Run an external backend under the C locale and return its stdout.
async fn run_cmd(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| MonitorError::command_error(program, err.to_string()))?;

    if !output.status.success() {
        return Err(MonitorError::command_error(
            program,
            format!("exited with {}", output.status),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn df_capacity(path: &Path) -> Result<f64> {
    let path = path.to_string_lossy();
    let output = run_cmd("df", &["-P", &*path]).await?;
    parse::parse_df_capacity(&output).map_err(|err| MonitorError::metric_error("disk", err.to_string()))
}

/// Linux collector: `top` for CPU, `free` for memory, `df` for disk and
/// `/proc/net/dev` for interface counters.
#[derive(Debug, Default)]
pub struct ProcfsCollector;

impl ProcfsCollector {
    pub fn new() -> Self {
        Self
    }

    async fn top_busy(&self) -> Result<f64> {
        let output = run_cmd("top", &["-bn1"]).await?;
        let idle = parse::parse_top_idle(&output)
            .map_err(|err| MonitorError::metric_error("cpu", err.to_string()))?;
        Ok(100.0 - idle)
    }
}

#[async_trait]
impl MetricsProvider for ProcfsCollector {
    fn name(&self) -> &'static str {
        "procfs"
    }

    async fn cpu_usage(&mut self) -> Result<f64> {
        self.top_busy().await
    }

    async fn memory_usage(&mut self) -> Result<f64> {
        let output = run_cmd("free", &["-b"]).await?;
        parse::parse_free_memory(&output)
            .map_err(|err| MonitorError::metric_error("memory", err.to_string()))
    }

    async fn disk_usage(&mut self, path: &Path) -> Result<f64> {
        df_capacity(path).await
    }

    async fn interface_counters(&mut self, interface: &str) -> Result<InterfaceCounters> {
        let content = tokio::fs::read_to_string("/proc/net/dev").await?;
        let (rx, tx) = parse::parse_proc_net_dev(&content)
            .remove(interface)
            .ok_or_else(|| MonitorError::InterfaceUnavailable(interface.to_string()))?;
        Ok(InterfaceCounters::new(interface, rx, tx))
    }
}

/// Single-board collector. CPU idle comes from `vmstat`, which is steadier
/// than `top` under ARM kernels; everything else is shared with procfs.
#[derive(Debug, Default)]
pub struct ConstrainedCollector {
    procfs: ProcfsCollector,
    vmstat_missing: bool,
}

impl ConstrainedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy percentage from `vmstat`, falling back to `top`.
    ///
    /// `top` is only awaited when `vmstat` is unusable. A `vmstat` that cannot
    /// be run sets `vmstat_missing` and is not awaited again; unparsable output
    /// falls back for this tick only.
    async fn busy_with<V, T>(vmstat_missing: &mut bool, vmstat: V, top: T) -> Result<f64>
    where
        V: Future<Output = Result<String>>,
        T: Future<Output = Result<f64>>,
    {
        if !*vmstat_missing {
            match vmstat.await {
                Ok(output) => match parse::parse_vmstat_idle(&output) {
                    Ok(idle) => return Ok(100.0 - idle),
                    Err(err) => debug!("vmstat output unusable, falling back to top: {err}"),
                },
                Err(err) => {
                    debug!("vmstat unavailable, using top from now on: {err}");
                    *vmstat_missing = true;
                }
            }
        }
        top.await
    }
}

#[async_trait]
impl MetricsProvider for ConstrainedCollector {
    fn name(&self) -> &'static str {
        "constrained"
    }

    async fn cpu_usage(&mut self) -> Result<f64> {
        Self::busy_with(
            &mut self.vmstat_missing,
            run_cmd("vmstat", &["1", "2"]),
            self.procfs.top_busy(),
        )
        .await
    }

    async fn memory_usage(&mut self) -> Result<f64> {
        self.procfs.memory_usage().await
    }

    async fn disk_usage(&mut self, path: &Path) -> Result<f64> {
        self.procfs.disk_usage(path).await
    }

    async fn interface_counters(&mut self, interface: &str) -> Result<InterfaceCounters> {
        self.procfs.interface_counters(interface).await
    }
}

/// Darwin collector: `top -l 1` for CPU, `vm_stat` over `hw.memsize` for
/// memory, `df` for disk and `netstat -ibn` for interface counters.
#[derive(Debug, Default)]
pub struct KernelStatsCollector {
    total_memory: Option<u64>,
}

impl KernelStatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    async fn total_memory(&mut self) -> Result<u64> {
        if let Some(total) = self.total_memory {
            return Ok(total);
        }
        let output = run_cmd("sysctl", &["-n", "hw.memsize"]).await?;
        let total = output
            .trim()
            .parse::<u64>()
            .map_err(|err| MonitorError::metric_error("memory", format!("hw.memsize: {err}")))?;
        self.total_memory = Some(total);
        Ok(total)
    }
}

#[async_trait]
impl MetricsProvider for KernelStatsCollector {
    fn name(&self) -> &'static str {
        "kernel-stats"
    }

    async fn cpu_usage(&mut self) -> Result<f64> {
        let output = run_cmd("top", &["-l", "1", "-n", "0"]).await?;
        parse::parse_top_darwin_busy(&output)
            .map_err(|err| MonitorError::metric_error("cpu", err.to_string()))
    }

    async fn memory_usage(&mut self) -> Result<f64> {
        let total = self.total_memory().await?;
        let output = run_cmd("vm_stat", &[]).await?;
        parse::parse_vm_stat_memory(&output, total)
            .map_err(|err| MonitorError::metric_error("memory", err.to_string()))
    }

    async fn disk_usage(&mut self, path: &Path) -> Result<f64> {
        df_capacity(path).await
    }

    async fn interface_counters(&mut self, interface: &str) -> Result<InterfaceCounters> {
        let output = run_cmd("netstat", &["-ibn", "-I", interface]).await?;
        let (rx, tx) = parse::parse_netstat_ib(&output, interface)?;
        Ok(InterfaceCounters::new(interface, rx, tx))
    }
}
