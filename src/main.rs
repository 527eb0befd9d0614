//! resmon - continuous system resource sampler binary.
//!
//! Prints one line per tick with CPU, memory, disk and network utilization,
//! optionally appending the same lines to a log file or running detached.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use resmon::sampler::sink::SinkSet;
use resmon::sampler::{ConsoleSink, FileSink};
use resmon::{
    daemon, provider_for, verify_mounted, InterfaceSelector, Platform, SampleConfig, Sampler,
    StopReason, DEFAULT_DISK_PATH, DEFAULT_DURATION_SECS, DEFAULT_INTERVAL_SECS,
};
use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
#[cfg(not(unix))]
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "resmon")]
#[command(about = "Continuous CPU, memory, disk and network sampler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Samples CPU, memory, disk and network utilization at a fixed interval and prints one line per sample"
)]
struct Cli {
    /// Total run length in seconds (runs until stopped in daemon mode when omitted)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    duration: Option<u64>,

    /// Sampling period in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Append samples to this log file (parent directory is created)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Report this network interface instead of auto-detecting one
    #[arg(long, value_name = "NAME")]
    interface: Option<String>,

    /// Report usage of the filesystem holding this path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DISK_PATH)]
    disk: PathBuf,

    /// Run in the background, detached from the terminal
    #[arg(long)]
    daemon: bool,

    /// Disable colored console output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    if let Err(err) = init_logging(&cli) {
        eprintln!("Error: cannot initialize logging: {err}");
        return ExitCode::from(1);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_config(cli: &Cli) -> SampleConfig {
    let duration = match cli.duration {
        Some(secs) => Some(Duration::from_secs(secs)),
        None if cli.daemon => None,
        None => Some(Duration::from_secs(DEFAULT_DURATION_SECS)),
    };
    let color = !cli.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();

    SampleConfig::default()
        .with_duration(duration)
        .with_interval(Duration::from_secs(cli.interval))
        .with_disk(cli.disk.clone())
        .with_interface(cli.interface.clone())
        .with_output(cli.output.clone())
        .with_daemon(cli.daemon)
        .with_color(color)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli);
    config.validate()?;
    verify_mounted(&config.disk).await?;

    if daemon::maybe_detach(&config)? {
        return Ok(());
    }

    let shutdown = shutdown_signal()?;
    tokio::pin!(shutdown);

    let platform = Platform::detect();
    info!(?platform, "selected metric backend");

    let mut sinks = SinkSet::new().with_sink(ConsoleSink::new(config.color));
    if let Some(path) = &config.output {
        let sink = FileSink::open(path)
            .with_context(|| format!("cannot use {} as log sink", path.display()))?;
        info!(path = %sink.path().display(), "appending samples to log file");
        sinks.push(Box::new(sink));
    }

    let mut selector = InterfaceSelector::new(platform);
    let interface = tokio::select! {
        resolved = selector.resolve(config.interface.as_deref()) => resolved?,
        _ = &mut shutdown => {
            info!("stopped by signal before sampling");
            return Ok(());
        }
    };

    info!(expected_ticks = ?config.expected_ticks(), "starting sampler");
    let mut sampler = Sampler::new(&config, provider_for(platform), interface);
    let summary = sampler.run(&mut sinks, shutdown).await;

    if summary.reason == StopReason::Cancelled {
        info!(samples = summary.samples, "stopped by signal");
    }

    Ok(())
}

/// Listen for SIGINT and SIGTERM. Handlers are installed before this
/// returns, so signals arriving before the future is first polled are kept.
#[cfg(unix)]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt()).context("cannot listen for SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("cannot listen for SIGTERM")?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}

/// Listen for Ctrl-C.
#[cfg(not(unix))]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "resmon",
            "--duration",
            "10",
            "--interval",
            "2",
            "--interface",
            "wlan0",
            "--output",
            "/tmp/resmon/t.log",
        ])
        .unwrap();
        assert_eq!(cli.duration, Some(10));
        assert_eq!(cli.interval, 2);
        assert_eq!(cli.interface.as_deref(), Some("wlan0"));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/resmon/t.log")));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["resmon"]).unwrap();
        assert_eq!(cli.duration, None);
        assert_eq!(cli.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(cli.disk, PathBuf::from("/"));
        assert!(!cli.daemon);

        let config = build_config(&cli);
        assert_eq!(config.duration, Some(Duration::from_secs(DEFAULT_DURATION_SECS)));
    }

    #[test]
    fn test_daemon_without_duration_is_unbounded() {
        let cli = Cli::try_parse_from(["resmon", "--daemon"]).unwrap();
        assert_eq!(build_config(&cli).duration, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["resmon", "--duration", "0"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "--interval", "-1"]).is_err());
        assert!(Cli::try_parse_from(["resmon", "--interval", "abc"]).is_err());

        let err = Cli::try_parse_from(["resmon", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_is_not_an_error_kind() {
        let err = Cli::try_parse_from(["resmon", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
