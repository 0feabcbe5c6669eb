//! Token lifetimes: `<integer><unit>` with unit `h`, `d` or `w`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Result, TokenError};

const HOUR_SECS: u64 = 60 * 60;

fn invalid(input: &str, reason: impl Into<String>) -> TokenError {
    TokenError::DurationParse {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse `"12h"`, `"7d"` or `"4w"`.
///
/// The magnitude must be plain ASCII digits; signs, spaces and fractions are
/// rejected rather than defaulted.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let Some(unit) = input.chars().last() else {
        return Err(invalid(input, "empty duration"));
    };
    let unit_secs = match unit {
        'h' => HOUR_SECS,
        'd' => 24 * HOUR_SECS,
        'w' => 7 * 24 * HOUR_SECS,
        other => return Err(invalid(input, format!("unknown unit '{other}'; use h, d or w"))),
    };

    let magnitude = &input[..input.len() - unit.len_utf8()];
    if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "magnitude must be a whole number"));
    }
    let value: u64 = magnitude
        .parse()
        .map_err(|_| invalid(input, "magnitude is too large"))?;
    let secs = value
        .checked_mul(unit_secs)
        .ok_or_else(|| invalid(input, "duration is too large"))?;
    Ok(Duration::from_secs(secs))
}

/// Absolute deadline, in epoch milliseconds, `input` after `now`.
pub fn expiry_deadline(input: &str, now: SystemTime) -> Result<i64> {
    let lifetime = parse_duration(input)?;
    let deadline = now
        .checked_add(lifetime)
        .ok_or_else(|| invalid(input, "deadline overflows the clock"))?;
    let millis = deadline
        .duration_since(UNIX_EPOCH)
        .map_err(|_| invalid(input, "system clock is before 1970"))?
        .as_millis();
    i64::try_from(millis).map_err(|_| invalid(input, "deadline overflows epoch milliseconds"))
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
