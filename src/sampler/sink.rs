//! Output sinks for formatted samples.

use crate::error::{MonitorError, Result};
use crate::metrics::data::MetricSample;
use colored::{ColoredString, Colorize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Destination for one line per tick.
pub trait SampleSink: Send {
    /// Write one sample as a whole line.
    fn write_sample(&mut self, sample: &MetricSample);

    /// Flush buffered output. Called on shutdown.
    fn flush(&mut self) {}
}

/// Console sink writing to stdout, optionally colorized.
pub struct ConsoleSink {
    color: bool,
}

impl ConsoleSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render `sample` with ANSI colors on its values.
    pub fn colorize(sample: &MetricSample) -> String {
        format!(
            "{} CPU: {} | MEM: {} | DISK({}): {} | NET({}) RX: {} | TX: {}",
            format!("[{}]", sample.timestamp_string()).dimmed(),
            level(format!("{:>3}%", sample.cpu_percent), sample.cpu_percent as f64),
            level(format!("{:>5.1}%", sample.memory_percent), sample.memory_percent),
            sample.disk_path,
            level(format!("{:>3}%", sample.disk_percent), sample.disk_percent as f64),
            sample.interface.as_str().cyan(),
            format!("{:>5.1}KB/s", sample.receive_kbps).blue(),
            format!("{:>5.1}KB/s", sample.transmit_kbps).magenta(),
        )
    }
}

fn level(text: String, percent: f64) -> ColoredString {
    if percent >= 90.0 {
        text.red().bold()
    } else if percent >= 70.0 {
        text.yellow()
    } else {
        text.green()
    }
}

impl SampleSink for ConsoleSink {
    fn write_sample(&mut self, sample: &MetricSample) {
        let line = if self.color {
            Self::colorize(sample)
        } else {
            sample.to_string()
        };
        let mut stdout = io::stdout().lock();
        // stdout is /dev/null when detached
        let _ = writeln!(stdout, "{line}");
    }

    fn flush(&mut self) {
        let _ = io::stdout().flush();
    }
}

/// Append-only log file sink. Lines are never colorized.
pub struct FileSink {
    path: PathBuf,
    writer: LineWriter<File>,
    failed: bool,
}

impl FileSink {
    /// Open `path` for appending, creating its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                MonitorError::config_error(format!("cannot open {}: {err}", path.display()))
            })?;

        Ok(Self {
            path,
            writer: LineWriter::new(file),
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").map_err(|source| MonitorError::SinkWrite {
            path: self.path.clone(),
            source,
        })
    }
}

impl SampleSink for FileSink {
    fn write_sample(&mut self, sample: &MetricSample) {
        if let Err(err) = self.append(&sample.to_string()) {
            if !self.failed {
                warn!(path = %self.path.display(), "{err}; console output continues");
                self.failed = true;
            }
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            warn!(path = %self.path.display(), "flush failed: {err}");
        }
    }
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|err| {
                MonitorError::config_error(format!(
                    "cannot create log directory {}: {err}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

/// Every configured sink, written in order.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn SampleSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl SampleSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn SampleSink>) {
        self.sinks.push(sink);
    }

    pub fn write_sample(&mut self, sample: &MetricSample) {
        for sink in &mut self.sinks {
            sink.write_sample(sample);
        }
    }

    pub fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::data::{NetworkRate, ProviderReading};
    use chrono::Local;

    fn sample() -> MetricSample {
        let reading = ProviderReading {
            cpu_percent: 95,
            memory_percent: 12.5,
            disk_percent: 75,
            counters: None,
        };
        MetricSample::from_reading(Local::now(), &reading, NetworkRate::ZERO, "/", "eth0")
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("resmon-sink-{}-{name}", std::process::id()))
            .join("nested")
            .join("out.log")
    }

    #[test]
    fn test_colorized_line_carries_ansi_codes() {
        colored::control::set_override(true);
        let line = ConsoleSink::colorize(&sample());
        assert!(line.contains("\u{1b}["));
        assert!(line.contains("DISK(/)"));
    }

    #[test]
    fn test_file_sink_appends_plain_lines() {
        let path = temp_path("plain");
        let mut sink = FileSink::open(&path).unwrap();
        sink.write_sample(&sample());
        sink.write_sample(&sample());
        sink.flush();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!content.contains('\u{1b}'));
        assert!(content.lines().all(|l| l.contains("CPU:  95%")));

        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_sink_set_fans_out() {
        struct Counting(std::sync::Arc<std::sync::atomic::AtomicUsize>);
        impl SampleSink for Counting {
            fn write_sample(&mut self, _sample: &MetricSample) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut sinks = SinkSet::new()
            .with_sink(Counting(count.clone()))
            .with_sink(Counting(count.clone()));
        sinks.write_sample(&sample());
        sinks.write_sample(&sample());

        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 4);
    }
}
