//! Registration token output formatting helpers.

use std::io::{self, Write};

use chrono::{Local, TimeZone};
use fedmesh_tokens::{RegistrationToken, TokenListing};

/// Local time of an epoch-millisecond timestamp, rendered with `fmt`.
fn local_time(epoch_ms: i64, fmt: &str) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map_or_else(|| format!("{epoch_ms} ms"), |t| t.format(fmt).to_string())
}

pub fn write_created(
    w: &mut impl Write,
    token: &RegistrationToken,
    registration_url: &str,
) -> io::Result<()> {
    writeln!(w, "Token:    {}", token.token)?;
    match token.uses_allowed {
        Some(n) => writeln!(w, "Uses:     {n}")?,
        None => writeln!(w, "Uses:     unlimited")?,
    }
    match token.expiry_time {
        Some(ms) => writeln!(w, "Expires:  {}", local_time(ms, "%Y-%m-%dT%H:%M:%S"))?,
        None => writeln!(w, "Expires:  never")?,
    }
    writeln!(w, "Register: {registration_url}")?;
    Ok(())
}

pub fn write_table(w: &mut impl Write, listings: &[TokenListing]) -> io::Result<()> {
    writeln!(w, "{:<14} {:<14} {:<12} EXPIRES", "TOKEN", "USES", "STATUS")?;
    for listing in listings {
        let expires = listing
            .token
            .expiry_time
            .map_or_else(|| "-".to_string(), |ms| local_time(ms, "%Y-%m-%d %H:%M"));
        writeln!(
            w,
            "{:<14} {:<14} {:<12} {expires}",
            listing.token.abbreviated(),
            listing.token.uses_summary(),
            listing.status.to_string(),
        )?;
    }
    Ok(())
}
