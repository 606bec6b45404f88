//! Serde helpers for the shapes the backend actually sends.
//!
//! Ids arrive as strings from the realtime feed but as integers from the
//! REST API; timestamps arrive as RFC 3339, as naive ISO datetimes without
//! an offset, or as bare dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Extract an entity id from a JSON value (string or integer)
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a timestamp in any of the accepted forms; naive values are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

pub mod id {
    use super::*;

    pub fn serialize<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        id_from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", value)))
    }
}

pub mod option_id {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_some(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(id_from_value))
    }
}

/// `Option<DateTime<Utc>>` that tolerates every accepted form; unparseable values become `None`
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => parse_timestamp(&s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_id_from_value() {
        assert_eq!(id_from_value(&serde_json::json!("p1")), Some("p1".to_string()));
        assert_eq!(id_from_value(&serde_json::json!(42)), Some("42".to_string()));
        assert_eq!(id_from_value(&serde_json::json!("")), None);
        assert_eq!(id_from_value(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let rfc = parse_timestamp("2024-03-01T10:30:00Z").unwrap();
        assert_eq!(rfc.hour(), 10);

        let offset = parse_timestamp("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(offset.hour(), 8);

        let naive = parse_timestamp("2024-03-01T10:30:00.123456").unwrap();
        assert_eq!(naive.minute(), 30);

        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.day(), 1);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
