// SPDX-License-Identifier: PMPL-1.0-or-later
//! Value coercion driven by condition type hints.
//!
//! Casting never fails: a value that cannot be converted to the requested
//! kind comes back unchanged and the operator decides what that means.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use uuid::Uuid;

use crate::value::Value;

/// `H:MM:SS`.
static CLOCK_INTERVAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+):(\d+)$").ok());

/// One `<n> <unit>` term of an interval phrase.
static INTERVAL_UNIT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(day|hour|minute|second)s?").ok());

/// Cast `value` according to `type_hint`.
///
/// Lists are cast element-wise. Without a hint only strings are touched,
/// and they are inferred as datetime, date, uuid and then a JSON literal.
pub fn cast_value(value: &Value, type_hint: Option<&str>) -> Value {
    if let Value::List(items) = value {
        return Value::List(items.iter().map(|item| cast_value(item, type_hint)).collect());
    }

    match type_hint {
        Some(hint) => cast_with_hint(value, hint).unwrap_or_else(|| value.clone()),
        None => match value {
            Value::String(s) => infer(s).unwrap_or_else(|| value.clone()),
            other => other.clone(),
        },
    }
}

fn cast_with_hint(value: &Value, hint: &str) -> Option<Value> {
    match hint.to_ascii_lowercase().as_str() {
        "string" | "text" => Some(Value::String(value.to_string())),
        "integer" | "int" | "smallinteger" | "biginteger" => match value {
            Value::Int(_) => Some(value.clone()),
            Value::Float(f) if f.is_finite() => Some(Value::Int(f.trunc() as i64)),
            Value::Bool(b) => Some(Value::Int(i64::from(*b))),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            _ => None,
        },
        "float" | "double" | "decimal" | "numeric" => match value {
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Float(_) => Some(value.clone()),
            Value::Bool(b) => Some(Value::Float(f64::from(u8::from(*b)))),
            Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        "boolean" | "bool" => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => Some(Value::Bool(matches!(
                s.to_lowercase().as_str(),
                "true" | "1" | "yes"
            ))),
            Value::Int(i) => Some(Value::Bool(*i != 0)),
            Value::Float(f) => Some(Value::Bool(*f != 0.0)),
            Value::Null => Some(Value::Bool(false)),
            Value::List(items) => Some(Value::Bool(!items.is_empty())),
            Value::Map(map) => Some(Value::Bool(!map.is_empty())),
            _ => Some(Value::Bool(true)),
        },
        "date" => match value {
            Value::Date(_) => Some(value.clone()),
            Value::DateTime(dt) => Some(Value::Date(dt.date())),
            Value::String(s) => parse_date(s)
                .or_else(|| parse_datetime(s).map(|dt| dt.date()))
                .map(Value::Date),
            _ => None,
        },
        "datetime" => match value {
            Value::DateTime(_) => Some(value.clone()),
            Value::String(s) => parse_datetime(s)
                .or_else(|| parse_date(s).map(|d| d.and_time(NaiveTime::MIN)))
                .map(Value::DateTime),
            _ => None,
        },
        "time" => match value {
            Value::Time(_) => Some(value.clone()),
            Value::String(s) => parse_time(s).map(Value::Time),
            _ => None,
        },
        "interval" => match value {
            Value::Interval(_) => Some(value.clone()),
            Value::String(s) => parse_interval(s).map(Value::Interval),
            Value::Int(_) | Value::Float(_) => value
                .as_f64()
                .and_then(seconds_to_duration)
                .map(Value::Interval),
            _ => None,
        },
        "uuid" => match value {
            Value::Uuid(_) => Some(value.clone()),
            Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
            _ => None,
        },
        "json" => match value {
            Value::Map(_) => Some(value.clone()),
            Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
                .ok()
                .map(Value::from),
            _ => None,
        },
        _ => None,
    }
}

fn infer(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    if let Some(dt) = parse_datetime(raw) {
        return Some(Value::DateTime(dt));
    }
    if let Some(d) = parse_date(raw) {
        return Some(Value::Date(d));
    }
    if let Ok(u) = Uuid::parse_str(raw.trim()) {
        return Some(Value::Uuid(u));
    }
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .map(Value::from)
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parse an ISO-8601 datetime. A `Z` or numeric offset is normalised to
/// naive UTC; a date without a time component is rejected.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    None
}

/// Parse a wall-clock time (`HH:MM[:SS[.fff]]`).
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Parse an interval.
///
/// Accepts `H:MM:SS`, unit phrases such as `1 day 2 hours 30 minutes`, and
/// bare seconds (`90`, `1.5`).
pub fn parse_interval(raw: &str) -> Option<Duration> {
    let trimmed = raw.trim();

    let clock = CLOCK_INTERVAL.as_ref()?;
    if let Some(caps) = clock.captures(trimmed) {
        let hours: i64 = caps[1].parse().ok()?;
        let minutes: i64 = caps[2].parse().ok()?;
        let seconds: i64 = caps[3].parse().ok()?;
        let total = hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(seconds)?;
        return Duration::try_seconds(total);
    }

    let units = INTERVAL_UNIT.as_ref()?;
    let mut parts: [Option<i64>; 4] = [None; 4];
    for caps in units.captures_iter(trimmed) {
        let slot = match caps[2].to_ascii_lowercase().as_str() {
            "day" => 0,
            "hour" => 1,
            "minute" => 2,
            _ => 3,
        };
        // First mention of a unit wins.
        if parts[slot].is_none() {
            parts[slot] = caps[1].parse().ok();
        }
    }

    let [days, hours, minutes, seconds] = parts.map(|p| p.unwrap_or(0));
    if days != 0 || hours != 0 || minutes != 0 || seconds != 0 {
        let total = days
            .checked_mul(86_400)?
            .checked_add(hours.checked_mul(3600)?)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(seconds)?;
        return Duration::try_seconds(total);
    }

    trimmed.parse::<f64>().ok().and_then(seconds_to_duration)
}

pub(crate) fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_milliseconds((seconds * 1000.0).round() as i64)
}

/// Interpret a condition value as a list.
///
/// Lists pass through. Strings are split on commas after stripping an
/// optional surrounding `[...]`; each item loses surrounding whitespace and
/// quotes. Any other value becomes a one-element list.
pub fn parse_list_value(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::String(s) => {
            let mut content = s.trim();
            if content.starts_with('[') && content.ends_with(']') && content.len() >= 2 {
                content = content[1..content.len() - 1].trim();
            }
            if content.is_empty() {
                return Vec::new();
            }
            content
                .split(',')
                .map(|item| {
                    let item = item.trim().trim_matches('\'').trim_matches('"');
                    Value::String(item.to_string())
                })
                .collect()
        }
        other => vec![other.clone()],
    }
}
