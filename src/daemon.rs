//! Background execution by relaunching the binary detached from the terminal.

use crate::config::SampleConfig;
use crate::error::{MonitorError, Result};
use crate::sampler::sink::ensure_parent_dir;
use chrono::Local;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// Set in the relaunched process so it runs the loop instead of detaching
/// again.
pub const DETACHED_ENV: &str = "RESMON_DETACHED";

/// Whether this process is already the detached copy.
pub fn is_detached() -> bool {
    std::env::var_os(DETACHED_ENV).is_some()
}

/// Timestamped log path under the system temporary directory.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "resmon_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Arguments for the relaunched process: the original ones (program name
/// excluded) with any `--output` replaced by `log_path`.
pub fn relaunch_args<I>(args: I, log_path: &Path) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut relaunched = Vec::new();
    let mut args = args.into_iter().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--output" {
            args.next();
            continue;
        }
        if arg.to_string_lossy().starts_with("--output=") {
            continue;
        }
        relaunched.push(arg);
    }

    relaunched.push(OsString::from("--output"));
    relaunched.push(log_path.as_os_str().to_os_string());
    relaunched
}

/// Relaunch in the background when daemon mode is requested.
///
/// Returns `Ok(true)` when a detached copy was started and this invocation
/// should exit, `Ok(false)` when the caller should sample in the foreground.
pub fn maybe_detach(config: &SampleConfig) -> Result<bool> {
    if !config.daemon || is_detached() {
        return Ok(false);
    }

    let log_path = config.output.clone().unwrap_or_else(default_log_path);
    ensure_parent_dir(&log_path)?;

    let exe = std::env::current_exe()
        .map_err(|err| MonitorError::daemon_error(format!("cannot locate executable: {err}")))?;
    let args = relaunch_args(std::env::args_os(), &log_path);

    let mut command = Command::new(exe);
    command
        .args(&args)
        .env(DETACHED_ENV, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    new_session(&mut command);

    let child = command
        .spawn()
        .map_err(|err| MonitorError::daemon_error(format!("cannot start background process: {err}")))?;

    info!(pid = child.id(), log = %log_path.display(), "detached");
    println!("Started in background (PID: {})", child.id());
    println!("Logging to {}", log_path.display());

    Ok(true)
}

/// Start the child in its own session so it has no controlling terminal.
#[cfg(unix)]
fn new_session(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn new_session(_command: &mut Command) {}
