//! Calendar dates for transactions.
//!
//! The UI sends dates either as plain `YYYY-MM-DD` strings or as full
//! RFC 3339 timestamps (what `Date.toISOString()` produces). Both are
//! accepted; timestamps are reduced to their UTC calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Error returned when a date string cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{0}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
pub struct DateParseError(String);

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `DateParseError` if the input matches neither format.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| DateParseError(trimmed.to_owned()))
}

/// Serde helper for required calendar date fields.
///
/// # Errors
///
/// Returns a deserialization error if the value is not a string in a
/// supported format.
pub fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

/// Serde helper for optional calendar date fields. Empty strings are `None`.
///
/// # Errors
///
/// Returns a deserialization error if a non-empty value is malformed.
pub fn deserialize_optional_calendar_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_calendar_date(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(deserialize_with = "deserialize_calendar_date")]
        date: NaiveDate,
        #[serde(default, deserialize_with = "deserialize_optional_calendar_date")]
        deadline: Option<NaiveDate>,
    }

    #[test]
    fn test_parse_plain_date() {
        let date = parse_calendar_date("2024-01-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_timestamp_uses_utc_day() {
        let date = parse_calendar_date("2024-03-05T23:30:00-02:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());

        let date = parse_calendar_date("2024-03-05T10:00:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_calendar_date("yesterday").is_err());
        assert!(parse_calendar_date("2024-13-01").is_err());
    }

    #[test]
    fn test_serde_helpers() {
        let payload: Payload =
            serde_json::from_str(r#"{"date": "2024-01-01", "deadline": ""}"#).unwrap();
        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(payload.deadline, None);

        let payload: Payload = serde_json::from_str(r#"{"date": "2024-01-01"}"#).unwrap();
        assert_eq!(payload.deadline, None);

        let err = serde_json::from_str::<Payload>(r#"{"date": "soon"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }
}
