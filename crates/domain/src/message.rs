//! Conversation messages with lenient timestamp parsing.
//!
//! Inbound events arrive from channel connectors that disagree on timestamp
//! formats: RFC 3339 strings, epoch seconds, epoch milliseconds, or nothing
//! at all. A turn is never rejected over a bad timestamp — we fall back to
//! "now" and move on.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One conversational turn as stored and returned on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "default_sender")]
    pub sender: String,
    /// May be empty — tolerated, not rejected.
    #[serde(default)]
    pub text: String,
    #[serde(default = "Utc::now", deserialize_with = "flexible_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build an agent-authored reply stamped with the current time.
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: "agent".to_owned(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

fn default_sender() -> String {
    "unknown".to_owned()
}

/// Epoch values above this magnitude are interpreted as milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

/// Parse a timestamp from whatever the connector sent.
///
/// * RFC 3339 (or RFC 3339 minus offset) strings parse normally.
/// * Numbers are epoch milliseconds when the magnitude exceeds 1e11,
///   epoch seconds otherwise.
/// * Missing, null, or unparseable values default to `Utc::now()`.
fn flexible_timestamp<'de, D>(de: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(de)?;
    Ok(parse_flexible(&raw))
}

/// Shared lenient-parse logic, usable outside serde too.
pub fn parse_flexible(raw: &serde_json::Value) -> DateTime<Utc> {
    match raw {
        serde_json::Value::String(s) => parse_timestamp_str(s).unwrap_or_else(Utc::now),
        serde_json::Value::Number(n) => {
            let epoch = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0);
            epoch_to_datetime(epoch).unwrap_or_else(Utc::now)
        }
        _ => Utc::now(),
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.trim().is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO 8601 without offset, e.g. "2026-01-30T10:00:00".
    if let Ok(naive) = s.parse::<chrono::NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    // Bare numeric string.
    s.trim().parse::<i64>().ok().and_then(epoch_to_datetime)
}

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    if epoch == 0 {
        return None;
    }
    if epoch.abs() > EPOCH_MILLIS_CUTOFF {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(json: &str) -> Message {
        serde_json::from_str(json).expect("message should deserialize")
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let m = msg(r#"{"sender":"scammer","text":"hi","timestamp":"2026-01-30T10:00:00Z"}"#);
        assert_eq!(m.timestamp.to_rfc3339(), "2026-01-30T10:00:00+00:00");
    }

    #[test]
    fn parses_epoch_millis_above_cutoff() {
        let m = msg(r#"{"sender":"scammer","text":"hi","timestamp":1769776085000}"#);
        assert_eq!(m.timestamp.timestamp(), 1_769_776_085);
    }

    #[test]
    fn parses_epoch_seconds_below_cutoff() {
        let m = msg(r#"{"sender":"scammer","text":"hi","timestamp":1769776085}"#);
        assert_eq!(m.timestamp.timestamp(), 1_769_776_085);
    }

    #[test]
    fn garbage_timestamp_defaults_to_now() {
        let before = Utc::now();
        let m = msg(r#"{"sender":"scammer","text":"hi","timestamp":"not a date"}"#);
        assert!(m.timestamp >= before);
    }

    #[test]
    fn missing_fields_default() {
        let m = msg(r#"{}"#);
        assert_eq!(m.sender, "unknown");
        assert_eq!(m.text, "");
    }

    #[test]
    fn empty_text_is_tolerated() {
        let m = msg(r#"{"sender":"scammer","text":""}"#);
        assert_eq!(m.text, "");
    }
}
