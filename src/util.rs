//! Utility functions for timing and reporting.

use std::time::Instant;

/// RAII timer that logs elapsed time on drop.
///
/// # Example
/// ```ignore
/// let _t = Timed::info("Sweep");
/// // ... do work ...
/// // logs "Sweep: 12.3ms" when _t is dropped
/// ```
pub struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    /// Create a new timer that logs at INFO level.
    pub fn info(name: &'static str) -> Self {
        Self::at(name, log::Level::Info)
    }

    /// Create a new timer that logs at DEBUG level.
    pub fn debug(name: &'static str) -> Self {
        Self::at(name, log::Level::Debug)
    }

    fn at(name: &'static str, level: log::Level) -> Self {
        log::trace!("{}...", name);
        Self {
            name,
            start: Instant::now(),
            level,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.1}ms", self.name, self.elapsed_ms());
    }
}

/// Parse a count with an optional `k` / `m` suffix ("500", "10k", "1.5m").
pub fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('m') {
        (n, 1_000_000.0)
    } else if let Some(n) = s.strip_suffix('k') {
        (n, 1_000.0)
    } else {
        (s.as_str(), 1.0)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

/// Short human form of a count: 950, 12k, 1.5M.
pub fn format_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}

/// Items per second for `count` items processed in `ms` milliseconds.
pub fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let per_sec = count as f64 / (ms / 1000.0);
    if per_sec >= 1_000_000.0 {
        format!("{:.2}M/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1}k/s", per_sec / 1000.0)
    } else {
        format!("{:.0}/s", per_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_suffixes() {
        assert_eq!(parse_count("250"), Ok(250));
        assert_eq!(parse_count("10k"), Ok(10_000));
        assert_eq!(parse_count("1.5M"), Ok(1_500_000));
        assert!(parse_count("lots").is_err());
    }

    #[test]
    fn test_format_num() {
        assert_eq!(format_num(950), "950");
        assert_eq!(format_num(12_345), "12k");
        assert_eq!(format_num(1_500_000), "1.5M");
        assert_eq!(format_rate(10, 0.0), "N/A");
    }
}
