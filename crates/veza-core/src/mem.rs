//! Process resident-set sampling for the `/mem` and `/search` surfaces.

/// Resident set size of the current process in kilobytes.
///
/// Reads `VmRSS` from `/proc/self/status`; returns 0 on platforms without
/// procfs (the field is informational, not load-bearing).
#[must_use]
pub fn rss_kb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmRSS:") {
                    if let Some(kb) = rest.split_whitespace().next() {
                        return kb.parse().unwrap_or(0);
                    }
                }
            }
        }
        0
    }
    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}
