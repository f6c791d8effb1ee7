//! Export timestamp decoding.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decode a `date_added` / `dateAdded` value.
///
/// Integers (and integer strings) are microseconds since the Unix epoch, as
/// Firefox writes them. Other strings must be RFC 3339. Returns `None` for
/// anything else.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_micros),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(micros) => DateTime::from_timestamp_micros(micros),
            Err(_) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        },
        _ => None,
    }
}
