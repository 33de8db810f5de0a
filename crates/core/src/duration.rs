// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration strings in `h/m/s` notation (`10s`, `1h30m`, `250ms`).

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,
    #[error("invalid number in duration: {0}")]
    InvalidNumber(String),
    #[error("unknown duration suffix: {0}")]
    UnknownSuffix(String),
    #[error("duration overflows: {0}")]
    Overflow(String),
}

/// Parse a duration made of one or more `<number><unit>` groups.
///
/// Units: `ns`, `us`, `ms`, `s`, `m`, `h`. A bare number is read as
/// seconds. Fractions are accepted per group (`1.5s`).
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        let secs: u64 = s.parse().map_err(|_| DurationError::InvalidNumber(s.to_string()))?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (num_str, tail) = rest.split_at(num_end);
        if num_str.is_empty() {
            return Err(DurationError::InvalidNumber(s.to_string()));
        }
        let num: f64 = num_str.parse().map_err(|_| DurationError::InvalidNumber(s.to_string()))?;

        let unit_end = tail
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            "" => return Err(DurationError::UnknownSuffix(format!("missing unit in {}", s))),
            other => return Err(DurationError::UnknownSuffix(other.to_string())),
        };

        let nanos = num * nanos_per_unit;
        if !nanos.is_finite() || nanos > u64::MAX as f64 {
            return Err(DurationError::Overflow(s.to_string()));
        }
        total = total
            .checked_add(Duration::from_nanos(nanos as u64))
            .ok_or_else(|| DurationError::Overflow(s.to_string()))?;
        rest = next;
    }

    Ok(total)
}

/// Render a duration back into the compact notation accepted by
/// [`parse_duration`], e.g. `90s` becomes `1m30s`.
pub fn format_duration(d: Duration) -> String {
    let mut secs = d.as_secs();
    let millis = d.subsec_millis();
    let mut out = String::new();
    let hours = secs / 3600;
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
        secs %= 3600;
    }
    let minutes = secs / 60;
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
        secs %= 60;
    }
    if secs > 0 || (out.is_empty() && millis == 0) {
        out.push_str(&format!("{}s", secs));
    }
    if millis > 0 {
        out.push_str(&format!("{}ms", millis));
    }
    out
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
