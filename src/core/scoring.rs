//! Weighted completeness scoring
//!
//! Ten criteria, each a `(name, weight, evaluator)` entry in one table,
//! folded by a single reducer into a 0-100 score. Boolean criteria
//! contribute 0 or 1; the three ratio criteria contribute fractions.
//! Scoring is a pure function of a [`ProjectContext`] - the reference
//! instant comes in with the context, never from the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::core::identity::WorkId;
use crate::entities::{LogEntry, Phase, Project, ProjectStatus};

/// Window for the "recent activity" signal
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

/// Activity values below this carry an "abandoned" issue, which in turn
/// feeds the archive-candidate policy
pub const LOW_ACTIVITY_THRESHOLD: f64 = 0.4;

/// Name prefixes that mark a record as never properly named
const PLACEHOLDER_NAME_PREFIXES: [&str; 4] = ["untitled", "new project", "placeholder", "tbd"];

/// Everything the scorer may look at for one project
pub struct ProjectContext<'a> {
    pub project: &'a Project,
    /// Phases resolved to this project
    pub phases: Vec<&'a Phase>,
    /// Log entries linked to this project
    pub entries: Vec<&'a LogEntry>,
    /// Reference instant for activity checks
    pub now: DateTime<Utc>,
}

/// One scoring criterion: a name, a weight, and a pure evaluator
pub struct Criterion {
    pub name: &'static str,
    pub weight: u32,
    eval: fn(&ProjectContext) -> f64,
}

/// The scoring table. The reducer normalizes by total weight, so weights
/// are relative, not percentages.
static CRITERIA: [Criterion; 10] = [
    Criterion { name: "has_phases", weight: 15, eval: has_phases },
    Criterion { name: "active_phase", weight: 10, eval: active_phase },
    Criterion { name: "has_owner", weight: 10, eval: has_owner },
    Criterion { name: "has_log_entries", weight: 15, eval: has_log_entries },
    Criterion { name: "completed", weight: 5, eval: completed },
    Criterion { name: "substantial_notes", weight: 10, eval: substantial_notes },
    Criterion { name: "rag_set", weight: 5, eval: rag_set },
    Criterion { name: "data_quality", weight: 20, eval: data_quality },
    Criterion { name: "phase_chain_integrity", weight: 15, eval: phase_chain_integrity },
    Criterion { name: "activity_level", weight: 15, eval: activity_level },
];

/// The scoring table, for callers that want to inspect weights
pub fn criteria() -> &'static [Criterion] {
    &CRITERIA
}

/// Evaluated value of one criterion
#[derive(Debug, Clone, Serialize)]
pub struct CriterionResult {
    pub name: &'static str,
    pub weight: u32,
    pub value: f64,
}

/// Completeness assessment for one project
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessAssessment {
    /// Weighted score in 0..=100
    pub score: u8,
    pub criteria: Vec<CriterionResult>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CompletenessAssessment {
    /// Value of a named criterion, if present
    pub fn criterion_value(&self, name: &str) -> Option<f64> {
        self.criteria.iter().find(|c| c.name == name).map(|c| c.value)
    }

    /// Whether the assessment flagged the project as abandoned
    pub fn has_abandoned_issue(&self) -> bool {
        self.issues.iter().any(|i| i.contains("abandoned"))
    }
}

/// Score a project against the criteria table.
pub fn assess(ctx: &ProjectContext) -> CompletenessAssessment {
    let results: Vec<CriterionResult> = CRITERIA
        .iter()
        .map(|c| CriterionResult {
            name: c.name,
            weight: c.weight,
            value: ((c.eval)(ctx)).clamp(0.0, 1.0),
        })
        .collect();

    let total_weight: u32 = results.iter().map(|r| r.weight).sum();
    let weighted: f64 = results.iter().map(|r| r.weight as f64 * r.value).sum();
    let score = (100.0 * weighted / total_weight as f64).round() as u8;

    let (issues, recommendations) = describe_failures(ctx, &results);

    CompletenessAssessment {
        score,
        criteria: results,
        issues,
        recommendations,
    }
}

/// Deterministic issue/recommendation text from failed criteria.
fn describe_failures(
    ctx: &ProjectContext,
    results: &[CriterionResult],
) -> (Vec<String>, Vec<String>) {
    let mut issues = Vec::new();
    let mut recs = Vec::new();

    let value = |name: &str| {
        results
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
            .unwrap_or(0.0)
    };
    let linked_phases = !ctx.phases.is_empty();

    if value("has_phases") == 0.0 {
        issues.push("no phases linked to this project".to_string());
        recs.push("create at least one phase".to_string());
    }
    if linked_phases && value("active_phase") == 0.0 {
        recs.push("mark an in-flight phase as active or close out the project".to_string());
    }
    if value("has_owner") == 0.0 {
        issues.push("no owner assigned".to_string());
        recs.push("assign a project owner".to_string());
    }
    if value("has_log_entries") == 0.0 {
        issues.push("no activity log entries reference this project".to_string());
        recs.push("record decisions and changes against this project".to_string());
    }
    if linked_phases && value("substantial_notes") == 0.0 {
        recs.push("capture phase progress in phase notes".to_string());
    }
    if linked_phases && value("rag_set") == 0.0 {
        recs.push("set a RAG status on at least one phase".to_string());
    }
    if !name_quality_ok(&ctx.project.name) {
        issues.push("project name is missing, too short, or a placeholder".to_string());
        recs.push("give the project a descriptive name".to_string());
    }
    if !WorkId::is_canonical(&ctx.project.project_id) {
        issues.push("project id is not in canonical PREFIX-NNN form".to_string());
    }
    if linked_phases && phase_field_ratio(ctx) < 1.0 {
        issues.push("some phases are missing a name, status, or dates".to_string());
    }
    if linked_phases && value("phase_chain_integrity") < 0.5 {
        issues.push("phase records are structurally incomplete".to_string());
    }
    if value("activity_level") < LOW_ACTIVITY_THRESHOLD {
        issues.push("project appears abandoned (no recent activity)".to_string());
        recs.push("archive the project or record fresh activity".to_string());
    }

    (issues, recs)
}

fn bool_val(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn has_phases(ctx: &ProjectContext) -> f64 {
    bool_val(!ctx.phases.is_empty())
}

fn active_phase(ctx: &ProjectContext) -> f64 {
    bool_val(ctx.phases.iter().any(|p| p.is_active_like()))
}

fn has_owner(ctx: &ProjectContext) -> f64 {
    bool_val(ctx.project.owner_trimmed().is_some())
}

fn has_log_entries(ctx: &ProjectContext) -> f64 {
    bool_val(!ctx.entries.is_empty())
}

fn completed(ctx: &ProjectContext) -> f64 {
    bool_val(ctx.project.status == ProjectStatus::Completed)
}

fn substantial_notes(ctx: &ProjectContext) -> f64 {
    bool_val(ctx.phases.iter().any(|p| p.notes.chars().count() > 50))
}

fn rag_set(ctx: &ProjectContext) -> f64 {
    bool_val(ctx.phases.iter().any(|p| p.rag_status.is_some()))
}

/// Average of three signals: name quality, canonical id, and the
/// fraction of phases carrying name + status + at least one date.
fn data_quality(ctx: &ProjectContext) -> f64 {
    let name_ok = bool_val(name_quality_ok(&ctx.project.name));
    let id_ok = bool_val(WorkId::is_canonical(&ctx.project.project_id));
    (name_ok + id_ok + phase_field_ratio(ctx)) / 3.0
}

/// Average over phases of structural presence: half for name + status,
/// half for any of start date, end date, or RAG.
fn phase_chain_integrity(ctx: &ProjectContext) -> f64 {
    if ctx.phases.is_empty() {
        return 0.0;
    }
    let sum: f64 = ctx
        .phases
        .iter()
        .map(|p| {
            let mut v = 0.0;
            if !p.name.trim().is_empty() && p.status_trimmed().is_some() {
                v += 0.5;
            }
            if p.has_any_date() || p.rag_status.is_some() {
                v += 0.5;
            }
            v
        })
        .sum();
    sum / ctx.phases.len() as f64
}

/// 0.4 for a log entry within the last 30 days, +0.3 for an active-like
/// phase, +0.3 for a substantive non-placeholder name; capped at 1.0.
fn activity_level(ctx: &ProjectContext) -> f64 {
    let mut v: f64 = 0.0;
    let recent = ctx.entries.iter().any(|e| match e.timestamp.as_datetime() {
        Some(ts) => ctx.now - ts <= Duration::days(ACTIVITY_WINDOW_DAYS),
        None => false,
    });
    if recent {
        v += 0.4;
    }
    if ctx.phases.iter().any(|p| p.is_active_like()) {
        v += 0.3;
    }
    let name = ctx.project.name.trim();
    if !is_placeholder_name(name) && name.chars().count() > 20 {
        v += 0.3;
    }
    v.min(1.0)
}

fn phase_field_ratio(ctx: &ProjectContext) -> f64 {
    if ctx.phases.is_empty() {
        return 0.0;
    }
    let complete = ctx
        .phases
        .iter()
        .filter(|p| {
            !p.name.trim().is_empty() && p.status_trimmed().is_some() && p.has_any_date()
        })
        .count();
    complete as f64 / ctx.phases.len() as f64
}

fn name_quality_ok(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() > 5 && !is_placeholder_name(name)
}

fn is_placeholder_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    PLACEHOLDER_NAME_PREFIXES
        .iter()
        .any(|p| lower.starts_with(p))
}
