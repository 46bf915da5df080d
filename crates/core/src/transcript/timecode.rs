//! Conversions between `HH:MM:SS.mmm` timestamps and seconds.
//!
//! Chapter boundaries are ordered and matched by comparing these strings
//! lexically, which is only sound while every timestamp keeps the fixed
//! zero-padded width. [`is_canonical`] and [`canonicalize`] guard that
//! contract where untrusted timestamps enter the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

static CANONICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2,}:[0-5]\d:[0-5]\d\.\d{3}$").expect("canonical timestamp pattern")
});

/// Parse `HH:MM:SS.mmm` into seconds. Never fails: anything unparseable is `0.0`.
pub fn parse_timestamp(ts: &str) -> f64 {
    if ts.is_empty() {
        return 0.0;
    }

    let mut parts = ts.split(':').map(|p| p.trim().parse::<f64>());
    let (Some(Ok(hours)), Some(Ok(minutes)), Some(Ok(seconds))) =
        (parts.next(), parts.next(), parts.next())
    else {
        return 0.0;
    };

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    if total.is_finite() { total } else { 0.0 }
}

/// Format seconds as `HH:MM:SS.mmm`. Missing, negative and non-finite input formats as zero.
pub fn format_timestamp(seconds: impl Into<Option<f64>>) -> String {
    let seconds = seconds
        .into()
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(0.0);

    let total_ms = (seconds * 1000.0).round() as u64;
    let hrs = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hrs, mins, secs, millis)
}

pub fn is_canonical(ts: &str) -> bool {
    CANONICAL.is_match(ts)
}

/// Strictly parse a loosely written timestamp (`H:MM:SS`, `MM:SS.s`, `SS.sss`)
/// and re-render it at canonical width. Surrounding brackets are dropped, as
/// in `[00:00:01.000]`. `None` if `ts` is not a timestamp.
pub fn canonicalize(ts: &str) -> Option<String> {
    let ts = ts.trim();
    let ts = ts.strip_prefix('[').unwrap_or(ts);
    let ts = ts.strip_suffix(']').unwrap_or(ts).trim();
    if is_canonical(ts) {
        return Some(ts.to_string());
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let is_last = i + 1 == parts.len();
        if !is_decimal(part, is_last) {
            return None;
        }
        let value: f64 = part.parse().ok()?;
        total = total * 60.0 + value;
    }

    Some(format_timestamp(total))
}

/// Digits only, with a single optional fractional part on the seconds field.
fn is_decimal(part: &str, allow_fraction: bool) -> bool {
    let (whole, fraction) = match part.split_once('.') {
        Some((w, f)) if allow_fraction => (w, Some(f)),
        Some(_) => return false,
        None => (part, None),
    };

    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}
