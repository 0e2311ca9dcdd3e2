//! Locale-sensitive creation-date parsing.
//!
//! Lead sources hand us timestamps like `"3/2/2026, 5:37:27 p.m."` —
//! day-first, Spanish meridiem markers, sometimes date-only, sometimes
//! garbage. The parser is total: any unparseable input degrades to the
//! caller-supplied "now" instant with the `failed` flag set, so a garbled
//! timestamp never drops a lead but stays visible as a data-quality issue.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

/// Result of parsing a creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub at: NaiveDateTime,
    /// True when `at` is the "now" sentinel instead of a parsed value.
    pub failed: bool,
}

fn pm_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)p\s*m").expect("static regex"))
}

fn am_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)a\s*m").expect("static regex"))
}

/// Parses a lead's `fecha_creacion` string.
///
/// The primary path handles the webhook's own format: periods stripped,
/// `p.m.`/`a.m.` mapped to standard meridiem tokens, the portion before
/// the first comma read as day-first `d/m/y`, the remainder as a time of
/// day (local midnight when absent). Day-first is the locale decision for
/// this data, not a guess. A fallback chain accepts unambiguous standard
/// formats (RFC 3339, `Y-m-d`); everything else degrades to `now`.
pub fn parse_creation_date(raw: Option<&str>, now: NaiveDateTime) -> ParsedDate {
    let failed = ParsedDate { at: now, failed: true };

    let Some(raw) = raw else {
        return failed;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return failed;
    }

    if let Some(at) = parse_locale_format(trimmed) {
        return ParsedDate { at, failed: false };
    }
    if let Some(at) = parse_standard_fallbacks(trimmed) {
        return ParsedDate { at, failed: false };
    }

    tracing::debug!("Unparseable creation date, degrading to now: {:?}", raw);
    failed
}

/// Primary path: `"d/m/y, h:mm:ss p.m."` and its date-only variant.
fn parse_locale_format(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = raw.replace('.', "");
    let cleaned = pm_marker().replace(&cleaned, "PM");
    let cleaned = am_marker().replace(&cleaned, "AM");

    let (date_part, time_part) = match cleaned.split_once(',') {
        Some((d, t)) => (d.trim(), Some(t.trim())),
        None => (cleaned.trim(), None),
    };

    let date = parse_day_first(date_part)?;
    let time = time_part
        .and_then(parse_time_of_day)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());

    Some(date.and_time(time))
}

/// Day-first `d/m/y` with numeric components. Not month-first.
fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let mut parts = s.splitn(3, '/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%I:%M:%S %p", "%I:%M %p", "%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    None
}

/// Fallback chain for sources that send standard formats instead.
/// Only unambiguous formats are accepted here; anything with a `d/m` vs
/// `m/d` ambiguity must go through the day-first primary path.
fn parse_standard_fallbacks(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()));
    }
    None
}
