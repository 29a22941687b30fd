//! Duplicate project clustering
//!
//! Greedy, input-order clustering: each unprocessed project seeds a
//! group, gathering every other unprocessed project whose name is close
//! enough (or whose owner matches with a lower name bar). Membership is
//! exclusive - once grouped, a project is never re-evaluated as a seed -
//! so groups are disjoint by construction. Singletons are not reported.

use serde::Serialize;

use crate::core::similarity::similarity;
use crate::entities::Project;

use super::policy::ReconcilePolicy;

/// Projects judged to represent the same underlying work
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub project_ids: Vec<String>,
}

/// Cluster near-duplicate projects per policy thresholds.
pub fn cluster_duplicates(projects: &[&Project], policy: &ReconcilePolicy) -> Vec<DuplicateGroup> {
    let mut processed = vec![false; projects.len()];
    let mut groups = Vec::new();

    for i in 0..projects.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let mut member_ids = vec![projects[i].project_id.clone()];
        for j in 0..projects.len() {
            if processed[j] {
                continue;
            }
            if is_duplicate_pair(projects[i], projects[j], policy) {
                processed[j] = true;
                member_ids.push(projects[j].project_id.clone());
            }
        }

        if member_ids.len() >= 2 {
            groups.push(DuplicateGroup {
                project_ids: member_ids,
            });
        }
    }

    groups
}

fn is_duplicate_pair(a: &Project, b: &Project, policy: &ReconcilePolicy) -> bool {
    let name_sim = similarity(&a.name, &b.name);
    if name_sim >= policy.name_similarity_threshold {
        return true;
    }
    match (a.owner_trimmed(), b.owner_trimmed()) {
        (Some(oa), Some(ob)) if oa == ob => name_sim >= policy.owner_name_similarity_threshold,
        _ => false,
    }
}
