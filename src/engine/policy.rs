//! Tunable reconciliation policy
//!
//! Thresholds and keyword lists the engine consults are data, not code,
//! so deployments can tune them without touching the linking or scoring
//! logic. The backfill gate in particular is a heuristic, not a law: it
//! exists to stop incidental mentions from minting spurious projects, and
//! is pluggable via [`BackfillGate`].

use serde::{Deserialize, Serialize};

use crate::entities::LogEntry;

/// Knobs for clustering, backfill gating, and archive detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Name similarity at or above this forms a duplicate group outright
    pub name_similarity_threshold: f64,

    /// Lower similarity bar applied when the owners match
    pub owner_name_similarity_threshold: f64,

    /// Entry types that justify backfilling a missing project
    /// (case-insensitive)
    pub actionable_entry_types: Vec<String>,

    /// Summary keywords that suggest the entry talks about real delivery
    /// work (case-insensitive substring match)
    pub project_keywords: Vec<String>,

    /// Id prefixes from decommissioned tooling; combined with near-zero
    /// activity they mark archive candidates
    pub legacy_id_prefixes: Vec<String>,

    /// Completeness score strictly below this is an archive candidate
    pub archive_score_threshold: u8,

    /// Activity level at or below this counts as "near zero" for the
    /// legacy-prefix archive rule
    pub near_zero_activity_threshold: f64,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            name_similarity_threshold: 0.8,
            owner_name_similarity_threshold: 0.6,
            actionable_entry_types: vec!["decision".to_string(), "change".to_string()],
            project_keywords: vec![
                "project".to_string(),
                "phase".to_string(),
                "milestone".to_string(),
                "initiative".to_string(),
                "workstream".to_string(),
            ],
            legacy_id_prefixes: vec![
                "LEGACY".to_string(),
                "OLD".to_string(),
                "ARCH".to_string(),
            ],
            archive_score_threshold: 20,
            near_zero_activity_threshold: 0.1,
        }
    }
}

impl ReconcilePolicy {
    /// Whether an id carries a legacy prefix (`LEGACY-3`, `OLD-12.1`, ...)
    pub fn has_legacy_prefix(&self, id: &str) -> bool {
        self.legacy_id_prefixes
            .iter()
            .any(|p| id.starts_with(&format!("{p}-")))
    }
}

/// Decides whether an orphaned entry should seed a backfill.
pub trait BackfillGate {
    fn should_backfill(&self, entry: &LogEntry, candidates: &[String]) -> bool;
}

/// Default gate: requires at least one candidate identifier, plus any of
/// an actionable entry type, a project-indicative summary keyword, or a
/// hyphenated `related_phase`.
#[derive(Debug, Clone)]
pub struct HeuristicGate {
    actionable_entry_types: Vec<String>,
    project_keywords: Vec<String>,
}

impl HeuristicGate {
    pub fn from_policy(policy: &ReconcilePolicy) -> Self {
        Self {
            actionable_entry_types: policy
                .actionable_entry_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            project_keywords: policy
                .project_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }
}

impl BackfillGate for HeuristicGate {
    fn should_backfill(&self, entry: &LogEntry, candidates: &[String]) -> bool {
        if candidates.iter().all(|c| c.trim().is_empty()) || candidates.is_empty() {
            return false;
        }

        let entry_type = entry.entry_type.trim().to_lowercase();
        if self.actionable_entry_types.iter().any(|t| *t == entry_type) {
            return true;
        }

        let summary = entry.summary.to_lowercase();
        if self.project_keywords.iter().any(|k| summary.contains(k)) {
            return true;
        }

        entry
            .related_phase
            .as_deref()
            .is_some_and(|p| p.contains('-'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> HeuristicGate {
        HeuristicGate::from_policy(&ReconcilePolicy::default())
    }

    fn entry(entry_type: &str, summary: &str, related_phase: Option<&str>) -> LogEntry {
        LogEntry {
            timestamp: crate::entities::Timestamp::Missing,
            entry_type: entry_type.to_string(),
            summary: summary.to_string(),
            related_phase: related_phase.map(str::to_string),
            related_step: None,
            actor: None,
        }
    }

    #[test]
    fn test_no_candidates_never_backfills() {
        let e = entry("Decision", "approved the project scope", Some("OF-9.1"));
        assert!(!gate().should_backfill(&e, &[]));
    }

    #[test]
    fn test_actionable_type_passes() {
        let e = entry("Decision", "approved scope", None);
        assert!(gate().should_backfill(&e, &["OF-9.1".to_string()]));
    }

    #[test]
    fn test_keyword_passes() {
        let e = entry("Note", "kicked off the milestone review", None);
        assert!(gate().should_backfill(&e, &["WT-2".to_string()]));
    }

    #[test]
    fn test_hyphenated_related_phase_passes() {
        let e = entry("Note", "weekly sync", Some("rollout-wave2"));
        assert!(gate().should_backfill(&e, &["WT-2".to_string()]));
    }

    #[test]
    fn test_incidental_mention_is_rejected() {
        let e = entry("Note", "chatted about lunch", Some("kickoff"));
        assert!(!gate().should_backfill(&e, &["WT-2".to_string()]));
    }
}
