//! Batch reconciliation
//!
//! Single-threaded, single-pass orchestration over one input batch: per
//! entry the state machine runs `Unprocessed -> IdentifiersExtracted ->
//! {Linked | Orphaned} -> BackfillQueued -> {Succeeded | Failed}`; around
//! it the engine validates records, links phases, scores projects,
//! clusters duplicates, and assembles one report in which every input
//! record's outcome appears. Ordering follows input order throughout, so
//! identical input yields an identical report.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::extract::extract_candidates;
use crate::core::identity::WorkId;
use crate::core::scoring::{self, CompletenessAssessment, ProjectContext};
use crate::core::store::RecordStore;
use crate::entities::{LogEntry, Phase, Project};

use super::backfill::{
    phase_seed_from_entry, project_seed_from_entry, BackfillOutcome, BackfillResult,
    BackfillWriter,
};
use super::duplicates::{cluster_duplicates, DuplicateGroup};
use super::orphans::{
    find_orphaned_phases, find_unreferenced_projects, resolve_project_ref, OrphanedPhase,
};
use super::policy::{BackfillGate, HeuristicGate, ReconcilePolicy};

/// Which input collection a skipped record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    Phase,
    LogEntry,
}

/// A malformed input record, skipped with its reason
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// The record's id when it has one, otherwise its input position
    pub key: String,
    pub reason: String,
}

/// A log entry linked to an existing project
#[derive(Debug, Clone, Serialize)]
pub struct LinkedEntry {
    pub entry_index: usize,
    pub project_id: String,
    /// The candidate identifier that resolved
    pub identifier: String,
    /// Non-fatal issues recorded against this entry (e.g. ambiguity)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// A log entry no identifier of which resolved to a project
#[derive(Debug, Clone, Serialize)]
pub struct OrphanedEntry {
    pub entry_index: usize,
    pub candidates: Vec<String>,
    /// Whether the backfill gate admitted this entry
    pub backfill_candidate: bool,
}

/// A project with its freshly computed assessment
#[derive(Debug, Clone, Serialize)]
pub struct ScoredProject {
    pub project_id: String,
    pub name: String,
    pub assessment: CompletenessAssessment,
}

/// Per-run outcome tallies
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileSummary {
    pub entries_total: usize,
    pub entries_linked: usize,
    pub entries_orphaned: usize,
    pub records_skipped: usize,
    pub projects_scored: usize,
    pub duplicate_groups: usize,
    pub backfills_created: usize,
    pub backfills_skipped_exists: usize,
    pub backfills_failed: usize,
}

/// One reconciliation run's complete output
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub linked: Vec<LinkedEntry>,
    pub orphaned: Vec<OrphanedEntry>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub orphaned_phases: Vec<OrphanedPhase>,
    pub unreferenced_projects: Vec<String>,
    pub archive_candidates: Vec<String>,
    /// Sorted descending by score; input order preserved on ties
    pub scored_projects: Vec<ScoredProject>,
    pub backfills: Vec<BackfillResult>,
    pub skipped: Vec<SkippedRecord>,
    pub summary: ReconcileSummary,
}

/// Engine options. `now` is explicit so a batch is reproducible.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub now: DateTime<Utc>,
    pub policy: ReconcilePolicy,
}

impl ReconcileOptions {
    /// Default policy at the given reference instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            policy: ReconcilePolicy::default(),
        }
    }
}

/// The reconciliation engine.
pub struct Reconciler {
    options: ReconcileOptions,
    gate: Box<dyn BackfillGate>,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        let gate = Box::new(HeuristicGate::from_policy(&options.policy));
        Self { options, gate }
    }

    /// Replace the backfill gate with a custom predicate.
    pub fn with_gate(mut self, gate: Box<dyn BackfillGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Reconcile without issuing any writes.
    pub fn analyze(
        &self,
        projects: &[Project],
        phases: &[Phase],
        entries: &[LogEntry],
    ) -> ReconcileReport {
        self.build(projects, phases, entries)
    }

    /// Reconcile and backfill missing records through the store.
    ///
    /// Backfill-queued identifiers are written at most once each per run;
    /// re-running the same batch against the same store creates nothing
    /// new (every previously created identifier reports `skipped_exists`).
    pub fn run<S: RecordStore + ?Sized>(
        &self,
        projects: &[Project],
        phases: &[Phase],
        entries: &[LogEntry],
        store: &mut S,
    ) -> ReconcileReport {
        let mut report = self.build(projects, phases, entries);

        let mut writer = BackfillWriter::new(store);
        let mut queued: HashSet<&str> = HashSet::new();
        let mut results = Vec::new();

        for orphan in report.orphaned.iter().filter(|o| o.backfill_candidate) {
            // The gate guarantees at least one candidate.
            let Some(identifier) = orphan.candidates.first() else {
                continue;
            };
            if !queued.insert(identifier) {
                continue;
            }
            let entry = &entries[orphan.entry_index];
            results.push(writer.ensure_project(project_seed_from_entry(identifier, entry)));

            // Phase-shaped identifiers (PREFIX-X.Y) also get a phase
            // record, as the source system's phase backfill did.
            let phase_shaped = WorkId::parse(identifier)
                .map(|id| id.minor().is_some())
                .unwrap_or(false);
            if phase_shaped {
                results.push(
                    writer.ensure_phase(phase_seed_from_entry(identifier, identifier, entry)),
                );
            }
        }

        for r in &results {
            match r.outcome {
                BackfillOutcome::Created => report.summary.backfills_created += 1,
                BackfillOutcome::SkippedExists => report.summary.backfills_skipped_exists += 1,
                BackfillOutcome::Failed => report.summary.backfills_failed += 1,
            }
        }
        report.backfills = results;
        report
    }

    fn build(
        &self,
        projects: &[Project],
        phases: &[Phase],
        entries: &[LogEntry],
    ) -> ReconcileReport {
        let now = self.options.now;
        let policy = &self.options.policy;
        let mut skipped = Vec::new();

        // Validate projects; duplicates of an id keep the first record.
        let mut valid_projects: Vec<&Project> = Vec::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();
        for (i, p) in projects.iter().enumerate() {
            let id = p.project_id.trim();
            if id.is_empty() {
                warn!(index = i, "skipping project with no id");
                skipped.push(SkippedRecord {
                    kind: RecordKind::Project,
                    key: format!("#{i}"),
                    reason: "missing projectId".to_string(),
                });
            } else if !seen_ids.insert(id) {
                warn!(project_id = id, "skipping project with duplicate id");
                skipped.push(SkippedRecord {
                    kind: RecordKind::Project,
                    key: id.to_string(),
                    reason: "duplicate projectId".to_string(),
                });
            } else {
                valid_projects.push(p);
            }
        }
        let project_ids: Vec<&str> = valid_projects
            .iter()
            .map(|p| p.project_id.as_str())
            .collect();
        let by_id: HashMap<&str, &Project> = valid_projects
            .iter()
            .map(|p| (p.project_id.as_str(), *p))
            .collect();

        // Validate phases.
        let mut valid_phases: Vec<&Phase> = Vec::new();
        for (i, ph) in phases.iter().enumerate() {
            if ph.phase_id.trim().is_empty() {
                warn!(index = i, "skipping phase with no id");
                skipped.push(SkippedRecord {
                    kind: RecordKind::Phase,
                    key: format!("#{i}"),
                    reason: "missing phaseId".to_string(),
                });
            } else {
                valid_phases.push(ph);
            }
        }

        // Link log entries by extracted identifier, exact key first wins.
        let mut linked = Vec::new();
        let mut orphaned = Vec::new();
        let mut entries_by_project: HashMap<&str, Vec<&LogEntry>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            // An absent timestamp is tolerated (the entry just carries no
            // recency signal); a present value that parses to nothing
            // marks the record malformed.
            if entry.timestamp.is_unparsable() {
                warn!(index = i, "skipping log entry with unparsable timestamp");
                skipped.push(SkippedRecord {
                    kind: RecordKind::LogEntry,
                    key: format!("#{i}"),
                    reason: "unparsable timestamp".to_string(),
                });
                continue;
            }

            let candidates = extract_candidates(entry);
            let resolved: Vec<&str> = candidates
                .iter()
                .filter_map(|c| by_id.get(c.as_str()).map(|p| p.project_id.as_str()))
                .collect();

            if let Some(&first) = resolved.first() {
                let mut distinct: Vec<&str> = Vec::new();
                for r in &resolved {
                    if !distinct.contains(r) {
                        distinct.push(r);
                    }
                }
                let mut issues = Vec::new();
                if distinct.len() > 1 {
                    warn!(
                        entry_index = i,
                        projects = %distinct.join(", "),
                        "ambiguous identifiers; linking first-extracted"
                    );
                    issues.push(format!(
                        "identifiers resolve to multiple projects ({}); linked first-extracted {}",
                        distinct.join(", "),
                        first
                    ));
                }
                debug!(entry_index = i, project_id = first, "linked entry");
                entries_by_project.entry(first).or_default().push(entry);
                linked.push(LinkedEntry {
                    entry_index: i,
                    project_id: first.to_string(),
                    identifier: first.to_string(),
                    issues,
                });
            } else {
                let backfill_candidate = self.gate.should_backfill(entry, &candidates);
                debug!(entry_index = i, backfill_candidate, "orphaned entry");
                orphaned.push(OrphanedEntry {
                    entry_index: i,
                    candidates,
                    backfill_candidate,
                });
            }
        }

        // Resolve phases to projects for scoring.
        let mut phases_by_project: HashMap<&str, Vec<&Phase>> = HashMap::new();
        for &ph in &valid_phases {
            if let Some(r) = ph.project_ref_trimmed() {
                if let Some(pid) = resolve_project_ref(&project_ids, r) {
                    phases_by_project.entry(pid).or_default().push(ph);
                }
            }
        }

        // Score every valid project against current state.
        let mut scored: Vec<ScoredProject> = valid_projects
            .iter()
            .map(|&p| {
                let id = p.project_id.as_str();
                let ctx = ProjectContext {
                    project: p,
                    phases: phases_by_project.get(id).cloned().unwrap_or_default(),
                    entries: entries_by_project.get(id).cloned().unwrap_or_default(),
                    now,
                };
                ScoredProject {
                    project_id: p.project_id.clone(),
                    name: p.name.clone(),
                    assessment: scoring::assess(&ctx),
                }
            })
            .collect();

        let archive_candidates: Vec<String> = scored
            .iter()
            .filter(|s| is_archive_candidate(policy, &s.project_id, &s.assessment))
            .map(|s| s.project_id.clone())
            .collect();

        // Stable sort: ties keep input order.
        scored.sort_by(|a, b| b.assessment.score.cmp(&a.assessment.score));

        let duplicate_groups = cluster_duplicates(&valid_projects, policy);
        let orphaned_phases = find_orphaned_phases(&valid_phases, &project_ids);
        let unreferenced_projects = find_unreferenced_projects(&project_ids, &valid_phases);

        let summary = ReconcileSummary {
            entries_total: entries.len(),
            entries_linked: linked.len(),
            entries_orphaned: orphaned.len(),
            records_skipped: skipped.len(),
            projects_scored: scored.len(),
            duplicate_groups: duplicate_groups.len(),
            backfills_created: 0,
            backfills_skipped_exists: 0,
            backfills_failed: 0,
        };

        ReconcileReport {
            linked,
            orphaned,
            duplicate_groups,
            orphaned_phases,
            unreferenced_projects,
            archive_candidates,
            scored_projects: scored,
            backfills: Vec::new(),
            skipped,
            summary,
        }
    }
}

fn is_archive_candidate(
    policy: &ReconcilePolicy,
    project_id: &str,
    assessment: &CompletenessAssessment,
) -> bool {
    if assessment.score < policy.archive_score_threshold {
        return true;
    }
    let activity = assessment
        .criterion_value("activity_level")
        .unwrap_or(0.0);
    if activity < scoring::LOW_ACTIVITY_THRESHOLD && assessment.has_abandoned_issue() {
        return true;
    }
    policy.has_legacy_prefix(project_id) && activity <= policy.near_zero_activity_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn opts() -> ReconcileOptions {
        ReconcileOptions::at(Utc.with_ymd_and_hms(2025, 8, 2, 12, 0, 0).unwrap())
    }

    fn projects(json: &str) -> Vec<Project> {
        serde_json::from_str(json).unwrap()
    }

    fn phases(json: &str) -> Vec<Phase> {
        serde_json::from_str(json).unwrap()
    }

    fn entries(json: &str) -> Vec<LogEntry> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_linked_entry_stops_at_first_resolving_identifier() {
        let ps = projects(r#"[{"projectId":"WT-1","name":"Billing platform migration"}]"#);
        let es = entries(
            r#"[{"timestamp":"2025-08-01T10:00:00Z","entryType":"Note",
                "summary":"WT-1 review","relatedPhase":"WT-1"}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &[], &es);
        assert_eq!(report.linked.len(), 1);
        assert_eq!(report.linked[0].project_id, "WT-1");
        assert!(report.linked[0].issues.is_empty());
        assert!(report.orphaned.is_empty());
    }

    #[test]
    fn test_ambiguous_identifiers_link_first_and_record_issue() {
        let ps = projects(
            r#"[{"projectId":"WT-1","name":"Billing platform"},
               {"projectId":"OF-2","name":"Onboarding flow"}]"#,
        );
        let es = entries(
            r#"[{"timestamp":"2025-08-01T10:00:00Z","entryType":"Note",
                "summary":"moved WT-1 scope into OF-2","relatedPhase":null}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &[], &es);
        assert_eq!(report.linked.len(), 1);
        assert_eq!(report.linked[0].project_id, "WT-1");
        assert_eq!(report.linked[0].issues.len(), 1);
        assert!(report.linked[0].issues[0].contains("OF-2"));
    }

    #[test]
    fn test_malformed_records_are_skipped_not_fatal() {
        let ps = projects(
            r#"[{"projectId":"  ","name":"ghost"},
               {"projectId":"WT-1","name":"Real project"},
               {"projectId":"WT-1","name":"Shadow copy"}]"#,
        );
        let es = entries(r#"[{"timestamp":"not a date","summary":"lost"}]"#);
        let report = Reconciler::new(opts()).analyze(&ps, &[], &es);

        assert_eq!(report.summary.projects_scored, 1);
        assert_eq!(report.skipped.len(), 3);
        let reasons: Vec<&str> = report.skipped.iter().map(|s| s.reason.as_str()).collect();
        assert!(reasons.contains(&"missing projectId"));
        assert!(reasons.contains(&"duplicate projectId"));
        assert!(reasons.contains(&"unparsable timestamp"));
    }

    #[test]
    fn test_entry_without_timestamp_is_reconciled_not_skipped() {
        use crate::core::MemoryStore;

        let es = entries(
            r#"[{"entryType":"Decision","relatedPhase":"OF-9.1",
                "summary":"approved OF-9.1 scope"}]"#,
        );
        let mut store = MemoryStore::new();
        let report = Reconciler::new(opts()).run(&[], &[], &es, &mut store);

        assert!(report.skipped.is_empty());
        assert_eq!(report.orphaned.len(), 1);
        assert!(report.orphaned[0].backfill_candidate);
        assert!(store.project_exists("OF-9.1"));

        let project_writes = report
            .backfills
            .iter()
            .filter(|r| r.kind == crate::engine::BackfillKind::Project)
            .count();
        assert_eq!(project_writes, 1);
    }

    #[test]
    fn test_scored_projects_sorted_descending() {
        let ps = projects(
            r#"[{"projectId":"WT-1","name":"x"},
               {"projectId":"WT-2","name":"Well described delivery initiative","owner":"Sam"}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &[], &[]);
        assert_eq!(report.scored_projects[0].project_id, "WT-2");
        let scores: Vec<u8> = report
            .scored_projects
            .iter()
            .map(|s| s.assessment.score)
            .collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn test_stale_project_is_archive_candidate() {
        // Owner + name length keep the score above the bare-minimum
        // threshold; low activity plus the abandoned issue catch it.
        let ps = projects(
            r#"[{"projectId":"LEGACY-4","name":"Mothballed intranet refresh workstream","owner":"Sam","status":"Active"}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &[], &[]);
        assert!(report
            .archive_candidates
            .contains(&"LEGACY-4".to_string()));
    }

    #[test]
    fn test_healthy_project_is_not_archive_candidate() {
        let ps = projects(
            r#"[{"projectId":"WT-1","name":"Billing platform migration work","owner":"Sam"}]"#,
        );
        let phs = phases(
            r#"[{"phaseId":"WT-1.1","name":"Build","projectRef":"WT-1",
                "status":"Active","ragStatus":"Green","startDate":"2025-07-01"}]"#,
        );
        let es = entries(
            r#"[{"timestamp":"2025-08-01T10:00:00Z","entryType":"Note","summary":"WT-1 sync"}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &phs, &es);
        assert!(report.archive_candidates.is_empty());
    }

    #[test]
    fn test_report_counts_every_entry() {
        let ps = projects(r#"[{"projectId":"WT-1","name":"Billing platform migration"}]"#);
        let es = entries(
            r#"[{"timestamp":"2025-08-01T10:00:00Z","summary":"WT-1 sync","entryType":"Note"},
               {"timestamp":"2025-08-01T11:00:00Z","summary":"no ids here","entryType":"Note"},
               {"timestamp":"garbage","summary":"WT-1"}]"#,
        );
        let report = Reconciler::new(opts()).analyze(&ps, &[], &es);
        let accounted = report.summary.entries_linked
            + report.summary.entries_orphaned
            + report.skipped.iter().filter(|s| s.kind == RecordKind::LogEntry).count();
        assert_eq!(accounted, report.summary.entries_total);
    }
}
