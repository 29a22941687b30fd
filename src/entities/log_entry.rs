//! Activity log entry record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de;

/// Timestamp field as recorded in the store.
///
/// Absent and present-but-unparsable are different states: an entry
/// written without a timestamp still describes real work and flows
/// through reconciliation (with no recency signal), while a present
/// value that parses to nothing marks the record as malformed and the
/// raw text is kept for the skip reason.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Timestamp {
    #[default]
    Missing,
    Unparsable(String),
    At(DateTime<Utc>),
}

impl Timestamp {
    /// The parsed instant, if there is one
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::At(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self, Timestamp::Unparsable(_))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Timestamp::Missing => serializer.serialize_none(),
            Timestamp::Unparsable(raw) => serializer.serialize_str(raw),
            Timestamp::At(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        }
    }
}

/// A free-form activity log entry.
///
/// Read-only input to reconciliation: inspected and classified, never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, deserialize_with = "de::lenient_timestamp")]
    pub timestamp: Timestamp,

    /// Entry classification ("Decision", "Change", "Note", ...); the
    /// store does not constrain this to a fixed set
    #[serde(default)]
    pub entry_type: String,

    /// Free-text summary of the activity
    #[serde(default)]
    pub summary: String,

    /// Phase reference as recorded by the author; free text
    #[serde(default)]
    pub related_phase: Option<String>,

    /// Step reference; often embeds the parent phase id as a prefix
    #[serde(default)]
    pub related_step: Option<String>,

    /// Who recorded the entry
    #[serde(default)]
    pub actor: Option<String>,
}

impl LogEntry {
    /// Non-empty trimmed actor, if set
    pub fn actor_trimmed(&self) -> Option<&str> {
        self.actor
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_entry() {
        let e: LogEntry = serde_json::from_str(
            r#"{
                "timestamp": "2025-08-02T10:30:00Z",
                "entryType": "Decision",
                "summary": "approved OF-9.1 scope",
                "relatedPhase": "OF-9.1",
                "actor": "Sam"
            }"#,
        )
        .unwrap();
        assert!(e.timestamp.as_datetime().is_some());
        assert_eq!(e.entry_type, "Decision");
        assert_eq!(e.related_phase.as_deref(), Some("OF-9.1"));
        assert_eq!(e.related_step, None);
    }

    #[test]
    fn test_unparsable_timestamp_keeps_raw_value() {
        let e: LogEntry =
            serde_json::from_str(r#"{"timestamp":"yesterday-ish","summary":"x"}"#).unwrap();
        assert_eq!(e.timestamp, Timestamp::Unparsable("yesterday-ish".to_string()));
        assert_eq!(e.timestamp.as_datetime(), None);
        assert!(e.timestamp.is_unparsable());
    }

    #[test]
    fn test_absent_timestamp_is_missing_not_unparsable() {
        let e: LogEntry = serde_json::from_str(r#"{"summary":"x"}"#).unwrap();
        assert_eq!(e.timestamp, Timestamp::Missing);
        assert!(!e.timestamp.is_unparsable());

        let e: LogEntry =
            serde_json::from_str(r#"{"timestamp":null,"summary":"x"}"#).unwrap();
        assert_eq!(e.timestamp, Timestamp::Missing);
    }

    #[test]
    fn test_blank_timestamp_is_missing() {
        let e: LogEntry =
            serde_json::from_str(r#"{"timestamp":"   ","summary":"x"}"#).unwrap();
        assert_eq!(e.timestamp, Timestamp::Missing);
    }
}
