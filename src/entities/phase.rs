//! Phase record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::de;

/// Red/Amber/Green delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RagStatus {
    Red,
    Amber,
    Green,
}

impl std::fmt::Display for RagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RagStatus::Red => write!(f, "Red"),
            RagStatus::Amber => write!(f, "Amber"),
            RagStatus::Green => write!(f, "Green"),
        }
    }
}

impl std::str::FromStr for RagStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "r" => Ok(RagStatus::Red),
            "amber" | "a" | "yellow" => Ok(RagStatus::Amber),
            "green" | "g" => Ok(RagStatus::Green),
            _ => Err(format!("Unknown RAG status: {}", s)),
        }
    }
}

/// A phase record from the work store.
///
/// Phase status is a free string in the source store, so it stays one
/// here; "active-like" is a case-insensitive check, not an enum variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Unique key
    pub phase_id: String,

    /// Phase name
    #[serde(default)]
    pub name: String,

    /// Foreign key to `Project.project_id`; may be absent or dangling
    #[serde(default)]
    pub project_ref: Option<String>,

    /// Free-form status string ("Planned", "Active", ...)
    #[serde(default)]
    pub status: Option<String>,

    /// RAG status; unrecognized values are treated as unset
    #[serde(default, deserialize_with = "de::lenient_rag")]
    pub rag_status: Option<RagStatus>,

    /// Free-form notes
    #[serde(default)]
    pub notes: String,

    #[serde(default, deserialize_with = "de::lenient_date")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "de::lenient_date")]
    pub end_date: Option<NaiveDate>,
}

impl Phase {
    /// Non-empty trimmed status, if set
    pub fn status_trimmed(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether the status string reads as in-flight work
    pub fn is_active_like(&self) -> bool {
        match self.status_trimmed() {
            Some(s) => {
                let normalized: String = s
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
                    .collect::<String>()
                    .to_lowercase();
                matches!(normalized.as_str(), "active" | "inprogress" | "started" | "underway")
            }
            None => false,
        }
    }

    /// Whether either boundary date is set
    pub fn has_any_date(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Non-empty trimmed project_ref, if set
    pub fn project_ref_trimmed(&self) -> Option<&str> {
        self.project_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}
