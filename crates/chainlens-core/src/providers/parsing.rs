//! Small accessors for provider JSON payloads.
//!
//! Every helper names the field it failed on, so a schema change at a
//! provider surfaces as a precise `InvalidResponse` instead of a panic.

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::CoreError;

/// Walk `path` through nested objects.
pub(super) fn field<'a>(
    value: &'a serde_json::Value,
    path: &[&str],
) -> Result<&'a serde_json::Value, CoreError> {
    path.iter().try_fold(value, |current, key| {
        current
            .get(key)
            .ok_or_else(|| CoreError::InvalidResponse(format!("missing {}", path.join("."))))
    })
}

pub(super) fn array<'a>(
    value: &'a serde_json::Value,
    path: &[&str],
) -> Result<&'a Vec<serde_json::Value>, CoreError> {
    field(value, path)?
        .as_array()
        .ok_or_else(|| CoreError::InvalidResponse(format!("{} is not an array", path.join("."))))
}

pub(super) fn string(value: &serde_json::Value, key: &str) -> Result<String, CoreError> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CoreError::InvalidResponse(format!("missing {key}")))
}

pub(super) fn opt_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

pub(super) fn bool_field(value: &serde_json::Value, key: &str) -> Result<bool, CoreError> {
    value
        .get(key)
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| CoreError::InvalidResponse(format!("missing {key}")))
}

/// Parse a required integer field. Numeric strings are accepted, since some
/// providers quote large integers.
pub(super) fn integer<T>(value: &serde_json::Value, key: &str) -> Result<T, CoreError>
where
    T: TryFrom<i64>,
{
    opt_integer(value, key)?.ok_or_else(|| CoreError::InvalidResponse(format!("missing {key}")))
}

/// Missing and `null` fields are `Ok(None)`; present but malformed or out of
/// range values are errors.
pub(super) fn opt_integer<T>(value: &serde_json::Value, key: &str) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64>,
{
    let raw = match value.get(key) {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(raw) => raw,
    };
    let n = match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| CoreError::InvalidResponse(format!("{key} is not an integer: {raw}")))?;
    T::try_from(n)
        .map(Some)
        .map_err(|_| CoreError::InvalidResponse(format!("{key} out of range: {n}")))
}

/// Position of an input or output within its transaction.
pub(super) fn position_index(n: usize, what: &str) -> Result<u32, CoreError> {
    u32::try_from(n).map_err(|_| CoreError::InvalidResponse(format!("too many {what}")))
}

/// Parse a `YYYY-MM-DD HH:MM:SS` UTC timestamp.
pub(super) fn utc_datetime(value: &serde_json::Value, key: &str) -> Option<OffsetDateTime> {
    let text = value.get(key)?.as_str()?;
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(text, format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Parse a unix-seconds timestamp.
pub(super) fn unix_datetime(value: &serde_json::Value, key: &str) -> Option<OffsetDateTime> {
    let secs = value.get(key)?.as_i64()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}
