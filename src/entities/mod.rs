//! Typed records for the loosely-structured work store
//!
//! These are the input shapes the reconciliation core consumes. How they
//! were loaded (file, API, database) is the caller's concern; the
//! deserializers here are deliberately lenient so one dirty field in a
//! loosely-structured store becomes a recorded per-record skip downstream
//! instead of a batch failure.

pub mod log_entry;
pub mod phase;
pub mod project;

pub use log_entry::{LogEntry, Timestamp};
pub use phase::{Phase, RagStatus};
pub use project::{Project, ProjectStatus};

pub(crate) mod de {
    //! Lenient field deserializers shared across record types

    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    use super::log_entry::Timestamp;
    use super::phase::RagStatus;
    use super::project::ProjectStatus;

    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    /// Absent/null/blank becomes `Missing`; a present value that parses
    /// to no instant keeps its raw text as `Unparsable`.
    pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            None => Timestamp::Missing,
            Some(s) if s.trim().is_empty() => Timestamp::Missing,
            Some(s) => match parse_datetime(&s) {
                Some(dt) => Timestamp::At(dt),
                None => Timestamp::Unparsable(s),
            },
        })
    }

    pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_date))
    }

    pub fn lenient_rag<'de, D>(deserializer: D) -> Result<Option<RagStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(|s| s.parse().ok()))
    }

    pub fn lenient_project_status<'de, D>(deserializer: D) -> Result<ProjectStatus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }

    pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.and_utc());
            }
        }
        parse_date(s).map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
    }

    pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d);
            }
        }
        // Datetime-shaped values keep their date component.
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        None
    }

}
