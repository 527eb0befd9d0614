//! Parsers for the text produced by external metric backends.
//!
//! Every backend is a black box with a small parsing contract: `top`,
//! `vmstat`, `free`, `df`, `vm_stat`, `netstat -ib` and the kernel's
//! `/proc/net/dev` table. Parsers are pure so each contract can be tested
//! against captured output.

use crate::error::{MonitorError, Result};
use std::collections::HashMap;

/// Idle CPU percentage from a Linux `top -bn1` summary.
///
/// Accepts the procps layouts (`96.9 id` and `96.9%id`) and the busybox
/// layout (`96% idle`).
pub fn parse_top_idle(output: &str) -> Result<f64> {
    let line = output
        .lines()
        .find(|line| line.contains("Cpu(s)") || line.trim_start().starts_with("CPU:"))
        .ok_or_else(|| MonitorError::parse_error("no CPU summary line in top output"))?;

    labelled_value(line, &["id", "idle"])
        .ok_or_else(|| MonitorError::parse_error(format!("no idle field in `{}`", line.trim())))
}

/// Busy CPU percentage (user + sys) from a Darwin `top -l 1` summary.
pub fn parse_top_darwin_busy(output: &str) -> Result<f64> {
    let line = output
        .lines()
        .find(|line| line.trim_start().starts_with("CPU usage"))
        .ok_or_else(|| MonitorError::parse_error("no CPU usage line in top output"))?;

    let user = labelled_value(line, &["user"]);
    let sys = labelled_value(line, &["sys"]);
    match (user, sys) {
        (Some(user), Some(sys)) => Ok(user + sys),
        _ => Err(MonitorError::parse_error(format!(
            "missing user/sys fields in `{}`",
            line.trim()
        ))),
    }
}

/// Idle CPU percentage from the last sample row of `vmstat 1 2`.
pub fn parse_vmstat_idle(output: &str) -> Result<f64> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();

    let header = lines
        .iter()
        .find(|line| line.split_whitespace().any(|t| t == "id"))
        .ok_or_else(|| MonitorError::parse_error("no column header in vmstat output"))?;
    let column = header
        .split_whitespace()
        .position(|t| t == "id")
        .ok_or_else(|| MonitorError::parse_error("no id column in vmstat output"))?;

    let row = lines
        .last()
        .filter(|line| line.split_whitespace().all(|t| t.parse::<f64>().is_ok()))
        .ok_or_else(|| MonitorError::parse_error("no sample row in vmstat output"))?;

    row.split_whitespace()
        .nth(column)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| MonitorError::parse_error("vmstat sample row is shorter than its header"))
}

/// Used memory percentage from `free -b`.
pub fn parse_free_memory(output: &str) -> Result<f64> {
    let row = output
        .lines()
        .find(|line| line.trim_start().starts_with("Mem:"))
        .ok_or_else(|| MonitorError::parse_error("no Mem: row in free output"))?;

    let fields: Vec<u64> = row
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();

    match fields.as_slice() {
        [total, used, ..] if *total > 0 => Ok(*used as f64 / *total as f64 * 100.0),
        [_, _, ..] => Err(MonitorError::parse_error("free reported zero total memory")),
        _ => Err(MonitorError::parse_error(format!(
            "unexpected Mem: row `{}`",
            row.trim()
        ))),
    }
}

/// Used memory percentage from Darwin `vm_stat`: active plus inactive pages
/// multiplied by the page size, over the physical memory size.
pub fn parse_vm_stat_memory(output: &str, total_bytes: u64) -> Result<f64> {
    if total_bytes == 0 {
        return Err(MonitorError::parse_error("hw.memsize reported zero"));
    }

    let mut page_size = 4096_u64;
    let mut active = None;
    let mut inactive = None;

    for line in output.lines() {
        if let Some(rest) = line.split("page size of").nth(1) {
            if let Some(size) = rest.split_whitespace().next().and_then(|s| s.parse().ok()) {
                page_size = size;
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let pages = value.trim().trim_end_matches('.').parse::<u64>().ok();
        match key.trim() {
            "Pages active" => active = pages,
            "Pages inactive" => inactive = pages,
            _ => {}
        }
    }

    match (active, inactive) {
        (Some(active), Some(inactive)) => {
            let used = (active + inactive).saturating_mul(page_size);
            Ok(used as f64 / total_bytes as f64 * 100.0)
        }
        _ => Err(MonitorError::parse_error(
            "vm_stat output lacks active/inactive page counts",
        )),
    }
}

/// Capacity percentage from POSIX `df -P <path>` output.
pub fn parse_df_capacity(output: &str) -> Result<f64> {
    let row = output
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .last()
        .ok_or_else(|| MonitorError::parse_error("no filesystem row in df output"))?;

    row.split_whitespace()
        .filter_map(|t| t.strip_suffix('%'))
        .find_map(|t| t.parse::<f64>().ok())
        .ok_or_else(|| MonitorError::parse_error(format!("no capacity field in `{}`", row.trim())))
}

/// Cumulative (received, transmitted) bytes per interface from `/proc/net/dev`.
pub fn parse_proc_net_dev(content: &str) -> HashMap<String, (u64, u64)> {
    let mut counters = HashMap::new();

    for line in content.lines().skip(2) {
        let Some((name, stats)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = stats.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        if let (Ok(rx), Ok(tx)) = (fields[0].parse::<u64>(), fields[8].parse::<u64>()) {
            counters.insert(name.trim().to_string(), (rx, tx));
        }
    }

    counters
}

/// Cumulative (received, transmitted) bytes of one interface from Darwin
/// `netstat -ibn`.
///
/// Only link-level rows (`<Link#N>`) are counted. The address column is
/// empty for some interfaces, so byte columns are located from the end of
/// the row: `... Ibytes Opkts Oerrs Obytes Coll`.
pub fn parse_netstat_ib(output: &str, interface: &str) -> Result<(u64, u64)> {
    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 || fields[0] != interface || !fields[2].starts_with("<Link#") {
            continue;
        }
        let n = fields.len();
        let rx = fields[n - 5].parse::<u64>();
        let tx = fields[n - 2].parse::<u64>();
        if let (Ok(rx), Ok(tx)) = (rx, tx) {
            return Ok((rx, tx));
        }
    }

    Err(MonitorError::InterfaceUnavailable(interface.to_string()))
}

/// Numeric value attached to one of `labels` in a `top` summary line.
///
/// Handles `96.9%id`, `96.9 id` and `96% idle`. Comma decimal separators
/// (`96,9 id`) are rejected since splitting on the comma would misread them.
fn labelled_value(line: &str, labels: &[&str]) -> Option<f64> {
    let body = line.split_once(':').map_or(line, |(_, body)| body);
    if has_decimal_comma(body) {
        return None;
    }
    let tokens: Vec<&str> = body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        if let Some((number, label)) = token.split_once('%') {
            if labels.contains(&label) {
                return number.parse().ok();
            }
        } else if i > 0 && labels.contains(token) {
            return tokens[i - 1].trim_end_matches('%').parse().ok();
        }
    }

    None
}

fn has_decimal_comma(text: &str) -> bool {
    text.as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b',' && w[2].is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCPS_TOP: &str = "\
top - 10:01:02 up 3 days,  2:11,  1 user,  load average: 0.08, 0.03, 0.01
Tasks: 112 total,   1 running, 111 sleeping,   0 stopped,   0 zombie
%Cpu(s):  2.0 us,  1.0 sy,  0.0 ni, 96.9 id,  0.0 wa,  0.0 hi,  0.1 si,  0.0 st
MiB Mem :   3794.3 total,   1933.5 free,    398.4 used,   1462.4 buff/cache
";

    const VMSTAT: &str = "\
procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----
 r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa st
 0  0      0 1979852  59348 1438284    0    0     3     5   41   63  1  0 99  0  0
 1  0      0 1979600  59348 1438284    0    0     0     0  212  301  3  1 95  1  0
";

    #[test]
    fn test_top_idle_procps() {
        assert_eq!(parse_top_idle(PROCPS_TOP).unwrap(), 96.9);
    }

    #[test]
    fn test_top_idle_legacy_and_busybox() {
        let legacy = "Cpu(s):  3.1%us,  1.0%sy,  0.0%ni, 95.8%id,  0.1%wa";
        assert_eq!(parse_top_idle(legacy).unwrap(), 95.8);

        let busybox = "Mem: 100K used\nCPU:   2% usr   1% sys   0% nic  96% idle   0% io   0% irq";
        assert_eq!(parse_top_idle(busybox).unwrap(), 96.0);
    }

    #[test]
    fn test_top_idle_garbage() {
        assert!(parse_top_idle("").is_err());
        assert!(parse_top_idle("%Cpu(s): n/a").is_err());
    }

    #[test]
    fn test_top_idle_comma_decimals_rejected() {
        let localized = "%Cpu(s):  2,0 us,  1,0 sy,  0,0 ni, 96,9 id,  0,0 wa,  0,0 hi,  0,1 si,  0,0 st";
        assert!(parse_top_idle(localized).is_err());

        let darwin = "CPU usage: 5,26% user, 10,52% sys, 84,21% idle";
        assert!(parse_top_darwin_busy(darwin).is_err());
    }

    #[test]
    fn test_top_darwin_busy() {
        let output = "Processes: 512 total\nCPU usage: 5.26% user, 10.52% sys, 84.21% idle\n";
        let busy = parse_top_darwin_busy(output).unwrap();
        assert!((busy - 15.78).abs() < 1e-9);
    }

    #[test]
    fn test_vmstat_idle_uses_last_row() {
        assert_eq!(parse_vmstat_idle(VMSTAT).unwrap(), 95.0);
    }

    #[test]
    fn test_vmstat_without_rows() {
        let header_only = VMSTAT.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(parse_vmstat_idle(&header_only).is_err());
    }

    #[test]
    fn test_free_memory() {
        let output = "\
               total        used        free      shared  buff/cache   available
Mem:      4000000000  1000000000  2000000000    10000000  1000000000  2900000000
Swap:              0           0           0
";
        assert_eq!(parse_free_memory(output).unwrap(), 25.0);
        assert!(parse_free_memory("Mem: 0 0 0").is_err());
        assert!(parse_free_memory("nothing here").is_err());
    }

    #[test]
    fn test_vm_stat_memory() {
        let output = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                               12000.
Pages active:                            100000.
Pages inactive:                           50000.
Pages speculative:                         1000.
";
        let total = 150_000 * 16384 * 2;
        assert_eq!(parse_vm_stat_memory(output, total).unwrap(), 50.0);
        assert!(parse_vm_stat_memory(output, 0).is_err());
        assert!(parse_vm_stat_memory("Pages free: 1.", total).is_err());
    }

    #[test]
    fn test_df_capacity() {
        let output = "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/root         30358348 12054532  17027920      42% /
";
        assert_eq!(parse_df_capacity(output).unwrap(), 42.0);
        assert!(parse_df_capacity("Filesystem 1024-blocks\n").is_err());
    }

    #[test]
    fn test_proc_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     100    0    0    0     0          0         0   123456     100    0    0    0     0       0          0
  eth0: 98765432  65432    0    0    0     0          0       120 12345678  43210    0    0    0     0       0          0
 wlan0:0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
";
        let counters = parse_proc_net_dev(content);
        assert_eq!(counters.get("eth0"), Some(&(98_765_432, 12_345_678)));
        assert_eq!(counters.get("lo"), Some(&(123_456, 123_456)));
        assert_eq!(counters.get("wlan0"), Some(&(0, 0)));
    }

    #[test]
    fn test_netstat_ib() {
        let output = "\
Name       Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
lo0        16384 <Link#1>                          9383     0    1536402     9383     0    1536402     0
en0        1500  <Link#6>    a4:83:e7:12:34:56   818282     0  902338127   401254     0   61928714     0
en0        1500  192.168.1     192.168.1.20      818200     -  902330000   401200     -   61920000     -
";
        assert_eq!(parse_netstat_ib(output, "en0").unwrap(), (902_338_127, 61_928_714));
        assert_eq!(parse_netstat_ib(output, "lo0").unwrap(), (1_536_402, 1_536_402));
        assert!(matches!(
            parse_netstat_ib(output, "en9"),
            Err(MonitorError::InterfaceUnavailable(_))
        ));
    }
}
