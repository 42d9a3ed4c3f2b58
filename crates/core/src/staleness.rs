//! `lastSeen` freshness check.
//!
//! The status source reports when it last heard from the game server. Timestamps
//! arrive in several ISO-8601 flavours: nanosecond fractions, a trailing `Z`, compact
//! `+0000` offsets, minute precision, a bare date, or no offset at all. They are
//! normalized before parsing.
//!
//! A timestamp that cannot be parsed counts as FRESH. A bad timestamp must not hide
//! real player activity, so this check fails open; see `malformed_timestamp_fails_open`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;

static LONG_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\d{6})\d+").expect("valid fraction regex"));

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Truncate sub-second precision to 6 digits and spell a trailing `Z` as `+00:00`
pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut normalized = LONG_FRACTION.replace(trimmed, ".$1").into_owned();
    if normalized.ends_with('Z') || normalized.ends_with('z') {
        normalized.pop();
        normalized.push_str("+00:00");
    }
    normalized
}

/// Parse a normalized timestamp. Values without an offset are taken as UTC, and a
/// bare date means midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_timestamp(raw);

    if let Ok(parsed) = DateTime::<FixedOffset>::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whether `last_seen` lies within `threshold_seconds` of `now`.
///
/// - empty timestamp: not fresh
/// - timestamp in the future: fresh
/// - unparseable timestamp: fresh (fail open, logged)
///
/// A threshold too large for `TimeDelta` is treated as unbounded.
pub fn is_fresh(last_seen: &str, now: DateTime<Utc>, threshold_seconds: i64) -> bool {
    if last_seen.trim().is_empty() {
        return false;
    }

    match parse_timestamp(last_seen) {
        Some(seen) => {
            let threshold = TimeDelta::try_seconds(threshold_seconds).unwrap_or(TimeDelta::MAX);
            now.signed_duration_since(seen) <= threshold
        }
        None => {
            tracing::warn!(
                timestamp = last_seen,
                "Could not parse lastSeen timestamp, assuming server is online"
            );
            true
        }
    }
}
