//! Orphaned-phase and unreferenced-project detection
//!
//! `project_ref` resolution is deliberately loose, matching the source
//! store's behavior: a ref resolves to a project when it equals the
//! project id or merely *contains* it. Containment can over-match (a ref
//! of `WT-10` contains `WT-1`), which is why exact matches are always
//! preferred when linking a phase to a single project; the permissive
//! semantics are pinned by tests rather than silently tightened.

use serde::Serialize;

use crate::entities::Phase;

/// A phase whose `project_ref` resolves to no known project
#[derive(Debug, Clone, Serialize)]
pub struct OrphanedPhase {
    pub phase_id: String,
    pub project_ref: String,
}

/// Whether a `project_ref` resolves to the given project id (exact or
/// containment).
pub fn ref_resolves(project_id: &str, project_ref: &str) -> bool {
    project_ref == project_id || project_ref.contains(project_id)
}

/// Resolve a `project_ref` to a single project id: exact match first,
/// then the first containing match in input order.
pub fn resolve_project_ref<'a>(project_ids: &[&'a str], project_ref: &str) -> Option<&'a str> {
    if let Some(id) = project_ids.iter().find(|id| **id == project_ref) {
        return Some(id);
    }
    project_ids
        .iter()
        .find(|id| project_ref.contains(**id))
        .copied()
}

/// Phases with a non-empty `project_ref` that resolves to no project,
/// in input order.
pub fn find_orphaned_phases(phases: &[&Phase], project_ids: &[&str]) -> Vec<OrphanedPhase> {
    phases
        .iter()
        .filter_map(|p| {
            let project_ref = p.project_ref_trimmed()?;
            if project_ids.iter().any(|id| ref_resolves(id, project_ref)) {
                None
            } else {
                Some(OrphanedPhase {
                    phase_id: p.phase_id.clone(),
                    project_ref: project_ref.to_string(),
                })
            }
        })
        .collect()
}

/// Projects no phase points at, in input order.
pub fn find_unreferenced_projects(project_ids: &[&str], phases: &[&Phase]) -> Vec<String> {
    project_ids
        .iter()
        .filter(|id| {
            !phases
                .iter()
                .any(|p| p.project_ref_trimmed().is_some_and(|r| ref_resolves(id, r)))
        })
        .map(|id| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: &str, project_ref: Option<&str>) -> Phase {
        let mut p: Phase =
            serde_json::from_str(&format!(r#"{{"phaseId":"{id}"}}"#)).unwrap();
        p.project_ref = project_ref.map(str::to_string);
        p
    }

    #[test]
    fn test_dangling_ref_is_orphaned() {
        let ph = phase("PH-1", Some("WT-9"));
        let refs = [&ph];
        let orphans = find_orphaned_phases(&refs, &["WT-1"]);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].phase_id, "PH-1");
        assert_eq!(orphans[0].project_ref, "WT-9");
    }

    #[test]
    fn test_resolving_ref_is_not_orphaned() {
        let ph = phase("PH-1", Some("WT-9"));
        let refs = [&ph];
        assert!(find_orphaned_phases(&refs, &["WT-9"]).is_empty());
    }

    #[test]
    fn test_missing_ref_is_not_orphaned() {
        let none = phase("PH-1", None);
        let blank = phase("PH-2", Some("  "));
        let refs = [&none, &blank];
        assert!(find_orphaned_phases(&refs, &["WT-1"]).is_empty());
    }

    #[test]
    fn test_containment_resolution_is_permissive() {
        // Documented loose semantics: a ref of "WT-10" contains "WT-1",
        // so WT-1 counts as referenced even though the author meant WT-10.
        let ph = phase("PH-1", Some("WT-10"));
        let refs = [&ph];
        let unreferenced = find_unreferenced_projects(&["WT-1", "WT-10"], &refs);
        assert!(unreferenced.is_empty());
    }

    #[test]
    fn test_exact_match_preferred_when_resolving_to_one() {
        // WT-1 comes first in input order and "WT-10" contains it, but
        // the exact match wins.
        assert_eq!(resolve_project_ref(&["WT-1", "WT-10"], "WT-10"), Some("WT-10"));
        // Without an exact match, first containment in input order.
        assert_eq!(resolve_project_ref(&["WT-1", "WT-10"], "WT-10b"), Some("WT-1"));
        assert_eq!(resolve_project_ref(&["WT-1"], "OF-9"), None);
    }

    #[test]
    fn test_unreferenced_projects_in_input_order() {
        let ph = phase("PH-1", Some("WT-2"));
        let refs = [&ph];
        let unreferenced = find_unreferenced_projects(&["WT-3", "WT-2", "WT-1"], &refs);
        assert_eq!(unreferenced, vec!["WT-3", "WT-1"]);
    }
}
