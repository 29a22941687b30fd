//! Project record

use serde::{Deserialize, Serialize};

use super::de;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Blocked,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Planning => write!(f, "Planning"),
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::OnHold => write!(f, "OnHold"),
            ProjectStatus::Completed => write!(f, "Completed"),
            ProjectStatus::Blocked => write!(f, "Blocked"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "planning" | "planned" => Ok(ProjectStatus::Planning),
            "active" | "inprogress" => Ok(ProjectStatus::Active),
            "onhold" | "hold" | "paused" => Ok(ProjectStatus::OnHold),
            "completed" | "complete" | "done" => Ok(ProjectStatus::Completed),
            "blocked" => Ok(ProjectStatus::Blocked),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

/// A project record from the work store.
///
/// Derived reconciliation fields (completeness score, issues,
/// recommendations) live on the report, not here: input records are
/// immutable and scoring is recomputed wholesale each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Stable unique key, canonically `PREFIX-NNN[.M]`
    pub project_id: String,

    /// Project name
    #[serde(default)]
    pub name: String,

    /// Owner, if assigned
    #[serde(default)]
    pub owner: Option<String>,

    /// Lifecycle status; unknown values fall back to Planning, the
    /// default the source store applied on import
    #[serde(default, deserialize_with = "de::lenient_project_status")]
    pub status: ProjectStatus,
}

impl Project {
    /// Owner with whitespace trimmed, None if missing or blank
    pub fn owner_trimmed(&self) -> Option<&str> {
        self.owner
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lenient_parse() {
        assert_eq!("On Hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("in-progress".parse::<ProjectStatus>().unwrap(), ProjectStatus::Active);
        assert_eq!("DONE".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
        assert!("mystery".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_unknown_status_deserializes_to_planning() {
        let p: Project =
            serde_json::from_str(r#"{"projectId":"WT-1","name":"X","status":"mystery"}"#).unwrap();
        assert_eq!(p.status, ProjectStatus::Planning);
    }

    #[test]
    fn test_missing_optional_fields() {
        let p: Project = serde_json::from_str(r#"{"projectId":"WT-1"}"#).unwrap();
        assert_eq!(p.name, "");
        assert_eq!(p.owner, None);
        assert_eq!(p.status, ProjectStatus::Planning);
    }

    #[test]
    fn test_owner_trimmed_filters_blank() {
        let mut p: Project = serde_json::from_str(r#"{"projectId":"WT-1"}"#).unwrap();
        p.owner = Some("   ".to_string());
        assert_eq!(p.owner_trimmed(), None);
        p.owner = Some(" Sam ".to_string());
        assert_eq!(p.owner_trimmed(), Some("Sam"));
    }
}
