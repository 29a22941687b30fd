//! Idempotent backfill writes
//!
//! Creates missing project/phase records inferred from orphaned log
//! entries, through the collaborator [`RecordStore`]. Each write
//! re-checks existence immediately beforehand; a create that still
//! collides (the check and the write are not atomic against external
//! writers) is reported as a skip, never an error.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::store::{PhaseSeed, ProjectSeed, RecordStore, StoreError};
use crate::entities::{LogEntry, ProjectStatus};

const SEED_NAME_MAX_CHARS: usize = 60;

/// Outcome of one ensure-exists write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillOutcome {
    Created,
    SkippedExists,
    Failed,
}

/// Which record kind a backfill targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillKind {
    Project,
    Phase,
}

/// Result of one backfill write, reported per identifier
#[derive(Debug, Clone, Serialize)]
pub struct BackfillResult {
    pub identifier: String,
    pub kind: BackfillKind,
    pub outcome: BackfillOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Performs ensure-exists writes against a collaborator store.
pub struct BackfillWriter<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: RecordStore + ?Sized> BackfillWriter<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Create the project if and only if no record with its id exists.
    pub fn ensure_project(&mut self, seed: ProjectSeed) -> BackfillResult {
        let id = seed.project_id.clone();
        if self.store.project_exists(&id) {
            debug!(project_id = %id, "backfill skipped, project exists");
            return result(id, BackfillKind::Project, BackfillOutcome::SkippedExists, None);
        }
        match self.store.create_project(seed) {
            Ok(()) => {
                debug!(project_id = %id, "backfilled project");
                result(id, BackfillKind::Project, BackfillOutcome::Created, None)
            }
            Err(StoreError::AlreadyExists(_)) => {
                // Lost the check-then-write race; same end state.
                debug!(project_id = %id, "backfill raced, project exists");
                result(id, BackfillKind::Project, BackfillOutcome::SkippedExists, None)
            }
            Err(e) => {
                warn!(project_id = %id, error = %e, "project backfill failed");
                result(
                    id,
                    BackfillKind::Project,
                    BackfillOutcome::Failed,
                    Some(e.to_string()),
                )
            }
        }
    }

    /// Create the phase if and only if no record with its id exists.
    pub fn ensure_phase(&mut self, seed: PhaseSeed) -> BackfillResult {
        let id = seed.phase_id.clone();
        if self.store.phase_exists(&id) {
            debug!(phase_id = %id, "backfill skipped, phase exists");
            return result(id, BackfillKind::Phase, BackfillOutcome::SkippedExists, None);
        }
        match self.store.create_phase(seed) {
            Ok(()) => {
                debug!(phase_id = %id, "backfilled phase");
                result(id, BackfillKind::Phase, BackfillOutcome::Created, None)
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!(phase_id = %id, "backfill raced, phase exists");
                result(id, BackfillKind::Phase, BackfillOutcome::SkippedExists, None)
            }
            Err(e) => {
                warn!(phase_id = %id, error = %e, "phase backfill failed");
                result(
                    id,
                    BackfillKind::Phase,
                    BackfillOutcome::Failed,
                    Some(e.to_string()),
                )
            }
        }
    }
}

fn result(
    identifier: String,
    kind: BackfillKind,
    outcome: BackfillOutcome,
    detail: Option<String>,
) -> BackfillResult {
    BackfillResult {
        identifier,
        kind,
        outcome,
        detail,
    }
}

/// Seed fields for a project inferred from a log entry: active status,
/// the entry's actor as owner (or "system"), and a name that points back
/// at the source activity.
pub fn project_seed_from_entry(identifier: &str, entry: &LogEntry) -> ProjectSeed {
    let summary = entry.summary.trim();
    let name = if summary.is_empty() {
        format!("{identifier} (backfilled from activity log)")
    } else {
        format!(
            "{} (backfilled from activity log)",
            truncate_chars(summary, SEED_NAME_MAX_CHARS)
        )
    };
    ProjectSeed {
        project_id: identifier.to_string(),
        name,
        status: ProjectStatus::Active,
        owner: entry
            .actor_trimmed()
            .unwrap_or("system")
            .to_string(),
    }
}

/// Seed fields for a phase record created alongside a backfilled project.
pub fn phase_seed_from_entry(identifier: &str, project_ref: &str, entry: &LogEntry) -> PhaseSeed {
    let phase_name = entry
        .related_phase
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(identifier);
    PhaseSeed {
        phase_id: identifier.to_string(),
        name: truncate_chars(phase_name, SEED_NAME_MAX_CHARS),
        project_ref: project_ref.to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn entry(summary: &str, actor: Option<&str>) -> LogEntry {
        LogEntry {
            timestamp: crate::entities::Timestamp::Missing,
            entry_type: "Decision".to_string(),
            summary: summary.to_string(),
            related_phase: None,
            related_step: None,
            actor: actor.map(str::to_string),
        }
    }

    #[test]
    fn test_create_then_skip_exists() {
        let mut store = MemoryStore::new();
        let e = entry("approved OF-9.1 scope", Some("Sam"));

        let first = {
            let mut writer = BackfillWriter::new(&mut store);
            writer.ensure_project(project_seed_from_entry("OF-9.1", &e))
        };
        assert_eq!(first.outcome, BackfillOutcome::Created);

        let second = {
            let mut writer = BackfillWriter::new(&mut store);
            writer.ensure_project(project_seed_from_entry("OF-9.1", &e))
        };
        assert_eq!(second.outcome, BackfillOutcome::SkippedExists);
    }

    #[test]
    fn test_seed_fields_from_entry() {
        let e = entry("approved OF-9.1 scope", Some("Sam"));
        let seed = project_seed_from_entry("OF-9.1", &e);
        assert_eq!(seed.project_id, "OF-9.1");
        assert_eq!(seed.status, ProjectStatus::Active);
        assert_eq!(seed.owner, "Sam");
        assert!(seed.name.contains("approved OF-9.1 scope"));
        assert!(seed.name.contains("backfilled"));
    }

    #[test]
    fn test_seed_owner_defaults_to_system() {
        let e = entry("", None);
        let seed = project_seed_from_entry("OF-9.1", &e);
        assert_eq!(seed.owner, "system");
        assert!(seed.name.starts_with("OF-9.1"));
    }

    /// Store whose check passes but whose create reports a collision -
    /// the shape a lost check-then-write race takes.
    struct RacyStore;

    impl RecordStore for RacyStore {
        fn project_exists(&self, _: &str) -> bool {
            false
        }
        fn phase_exists(&self, _: &str) -> bool {
            false
        }
        fn create_project(&mut self, seed: ProjectSeed) -> Result<(), StoreError> {
            Err(StoreError::AlreadyExists(seed.project_id))
        }
        fn create_phase(&mut self, seed: PhaseSeed) -> Result<(), StoreError> {
            Err(StoreError::AlreadyExists(seed.phase_id))
        }
    }

    #[test]
    fn test_race_collision_reports_skipped_not_failed() {
        let mut store = RacyStore;
        let e = entry("change approved", None);
        let mut writer = BackfillWriter::new(&mut store);
        let r = writer.ensure_project(project_seed_from_entry("WT-4", &e));
        assert_eq!(r.outcome, BackfillOutcome::SkippedExists);
        assert!(r.detail.is_none());
    }

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn project_exists(&self, _: &str) -> bool {
            false
        }
        fn phase_exists(&self, _: &str) -> bool {
            false
        }
        fn create_project(&mut self, _: ProjectSeed) -> Result<(), StoreError> {
            Err(StoreError::WriteRejected("connection reset".to_string()))
        }
        fn create_phase(&mut self, _: PhaseSeed) -> Result<(), StoreError> {
            Err(StoreError::WriteRejected("connection reset".to_string()))
        }
    }

    #[test]
    fn test_write_failure_is_reported_per_record() {
        let mut store = BrokenStore;
        let e = entry("change approved", None);
        let mut writer = BackfillWriter::new(&mut store);
        let r = writer.ensure_project(project_seed_from_entry("WT-4", &e));
        assert_eq!(r.outcome, BackfillOutcome::Failed);
        assert!(r.detail.unwrap().contains("connection reset"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "é".repeat(100);
        let t = truncate_chars(&s, 10);
        assert_eq!(t.chars().count(), 10);
    }
}
