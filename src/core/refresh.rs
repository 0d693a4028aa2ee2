// src/core/refresh.rs

use crate::constants::MIN_REFRESH_SECS;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref REFRESH_RE: Regex =
        Regex::new(r"^\s*(\d+)\s*([smhd])\s*$").expect("Failed to compile refresh regex");
}

/// Parses a `refreshTime` value such as `30s`, `5m`, `1h` or `1d`.
///
/// Intervals shorter than ten seconds are raised to ten seconds. Anything
/// unparseable (or overflowing) yields `None`.
pub fn parse_refresh_time(value: &str) -> Option<Duration> {
    let caps = REFRESH_RE.captures(value)?;
    let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = match caps.get(2)?.as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    let secs = amount.checked_mul(unit)?;
    Some(Duration::from_secs(secs.max(MIN_REFRESH_SECS)))
}
