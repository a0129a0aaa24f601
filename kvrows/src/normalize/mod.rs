//! Record normalization: one raw store entry in, one flat record out.
//!
//! Fields are written in this order, each write overriding earlier ones:
//!
//! 1. Entry metadata (`key`, `value`, `versionstamp`)
//! 2. Top-level fields of the payload
//! 3. `ts` (unchanged) and a derived ISO-8601 `time`
//! 4. `url`, URI-decoded
//! 5. `referer` from `headers.referer`
//! 6. `ua` from `headers["user-agent"]`
//!
//! Derived fields are only written when their source is present and truthy.

mod uri;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::schema::{FlatRecord, RawEntry};
use crate::{Error, Result};

pub use uri::decode_uri;

/// Flatten one entry into a display record.
pub fn normalize(entry: &RawEntry) -> Result<FlatRecord> {
    let payload = &entry.value;

    let mut record = entry.metadata();
    record.merge(payload.iter().map(|(k, v)| (k.clone(), v.clone())));

    if let Some(ts) = payload.get("ts").filter(|v| is_truthy(v)) {
        let time = iso_time(ts)?;
        record.insert("ts", ts.clone());
        record.insert("time", Value::String(time));
    }

    if let Some(url) = payload.get("url").filter(|v| is_truthy(v)).and_then(Value::as_str) {
        record.insert("url", Value::String(decode_uri(url)?));
    }

    let headers = payload.get("headers");

    if let Some(referer) = headers.and_then(|h| h.get("referer")).filter(|v| is_truthy(v)) {
        record.insert("referer", referer.clone());
    }

    if let Some(ua) = headers.and_then(|h| h.get("user-agent")).filter(|v| is_truthy(v)) {
        record.insert("ua", ua.clone());
    }

    Ok(record)
}

/// Truthiness of a loosely typed payload value: null, false, zero, NaN and
/// the empty string are falsy, everything else (including empty arrays and
/// objects) is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert epoch seconds to an ISO-8601 UTC string with millisecond
/// precision, e.g. `2023-11-14T22:13:20.000Z`.
fn iso_time(ts: &Value) -> Result<String> {
    let seconds = match ts {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .ok_or_else(|| Error::Timestamp(format!("{} is not a number of seconds", ts)))?;

    let millis = (seconds * 1000.0).trunc();
    if millis.abs() > i64::MAX as f64 {
        return Err(Error::Timestamp(format!("{} is out of range", ts)));
    }

    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::Timestamp(format!("{} is out of range", ts)))
}
