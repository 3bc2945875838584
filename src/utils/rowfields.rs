//! Lenient accessors over JSON rows coming back from the ticket store.
//!
//! Every accessor returns `None` instead of failing: the store is written by an
//! external operator system and optional columns drift between deployments.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Non-empty text. Numbers are accepted and rendered as text since some
/// deployments store ticket codes as integers.
pub fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric value, including numbers serialized as strings (Postgres `numeric`).
pub fn number(row: &Value, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// RFC 3339 text, a naive timestamp (taken as UTC), or epoch seconds.
pub fn timestamp(row: &Value, key: &str) -> Option<DateTime<Utc>> {
    match row.get(key)? {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    // Postgres `timestamptz` text form: "2024-05-02 10:15:00+00"
    if let Ok(at) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(at.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
