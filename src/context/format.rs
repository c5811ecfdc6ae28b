//! Display formatting for raw session fields.

use chrono::{DateTime, Local, Utc};

/// Format a USD cost: `$0.00` when absent or zero, otherwise four decimals.
pub fn format_cost(usd: Option<f64>) -> String {
    match usd {
        Some(usd) if usd != 0.0 && !usd.is_nan() => format!("${:.4}", usd),
        _ => "$0.00".to_string(),
    }
}

/// Format a millisecond duration: `1.5s` under a minute, `2m5s` above.
pub fn format_duration(ms: Option<f64>) -> String {
    let ms = match ms {
        Some(ms) if ms != 0.0 && !ms.is_nan() => ms,
        _ => return "0s".to_string(),
    };

    let seconds = ms / 1000.0;
    if seconds < 60.0 {
        return format!("{}s", one_decimal(seconds));
    }

    let minutes = (seconds / 60.0).floor();
    let remainder = (seconds % 60.0).floor();
    format!("{}m{}s", minutes as u64, remainder as u64)
}

/// One decimal place, rounded on the exact binary value of `x`.
///
/// `1.15` is stored as `1.1499...` and gives `1.1`. Only values that sit exactly
/// on a half (`x.25`, `x.75`) are ties, and those round away from zero.
pub fn one_decimal(x: f64) -> String {
    let is_tie = (x * 4.0).fract() == 0.0 && (x * 2.0).fract() != 0.0;
    if is_tie {
        format!("{:.1}", (x * 10.0).round() / 10.0)
    } else {
        format!("{:.1}", x)
    }
}

/// Replace a leading home directory with `~`.
///
/// Only a whole-component prefix is replaced, so `/home/user2` is left alone
/// for home `/home/user`. Applying it twice changes nothing.
pub fn shorten_path(path: &str, home: &str) -> String {
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}

/// ISO-8601 UTC timestamp with milliseconds, e.g. `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(now: &DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Local date, e.g. `1/1/2024`.
pub fn format_date(now: &DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

/// Local time of day, e.g. `12:00:00 AM`.
pub fn format_time(now: &DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%-I:%M:%S %p").to_string()
}
