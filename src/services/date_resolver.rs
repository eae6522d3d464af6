//! Timestamp resolution for heterogeneous date representations.
//!
//! Accepted shapes: epoch milliseconds (integer or float), RFC 3339 / ISO-8601
//! strings, plain `YYYY-MM-DD` dates, naive `YYYY-MM-DDTHH:MM:SS` strings
//! (read as UTC) and `{seconds, nanoseconds}` objects (also spelled
//! `{_seconds, _nanoseconds}`). Anything else resolves to `None`; nothing
//! here returns an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

pub fn resolve_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    let resolved = match value {
        JsonValue::Number(_) => whole_number(value).and_then(from_epoch_millis),
        JsonValue::String(raw) => parse_date_string(raw),
        JsonValue::Object(map) => {
            let seconds = map.get("seconds").or_else(|| map.get("_seconds"));
            let nanos = map.get("nanoseconds").or_else(|| map.get("_nanoseconds"));
            seconds.and_then(|seconds| from_seconds_pair(seconds, nanos))
        }
        _ => None,
    };

    if resolved.is_none() && !value.is_null() {
        debug!(target: "analytics::date", value = %value, "unresolvable timestamp");
    }
    resolved
}

pub fn resolve_date(value: &JsonValue) -> Option<NaiveDate> {
    resolve_timestamp(value).map(|timestamp| timestamp.date_naive())
}

fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn from_seconds_pair(seconds: &JsonValue, nanos: Option<&JsonValue>) -> Option<DateTime<Utc>> {
    let seconds = whole_number(seconds)?;
    let nanos = match nanos {
        None | Some(JsonValue::Null) => 0,
        Some(value) => whole_number(value)?,
    };
    if !(0..NANOS_PER_SECOND).contains(&nanos) {
        return None;
    }
    Utc.timestamp_opt(seconds, nanos as u32).single()
}

/// Integer or float JSON number, truncated toward zero. Floats outside the
/// `i64` range are rejected rather than saturated.
fn whole_number(value: &JsonValue) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.is_finite())
            .map(f64::trunc)
            .filter(|number| *number >= i64::MIN as f64 && *number < i64::MAX as f64)
            .map(|number| number as i64)
    })
}

fn parse_date_string(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
