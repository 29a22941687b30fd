//! Reconciliation engine: linking, clustering, orphan detection, backfill

pub mod backfill;
pub mod duplicates;
pub mod orphans;
pub mod policy;
pub mod reconcile;

pub use backfill::{
    phase_seed_from_entry, project_seed_from_entry, BackfillKind, BackfillOutcome, BackfillResult,
    BackfillWriter,
};
pub use duplicates::{cluster_duplicates, DuplicateGroup};
pub use orphans::{
    find_orphaned_phases, find_unreferenced_projects, ref_resolves, resolve_project_ref,
    OrphanedPhase,
};
pub use policy::{BackfillGate, HeuristicGate, ReconcilePolicy};
pub use reconcile::{
    LinkedEntry, OrphanedEntry, ReconcileOptions, ReconcileReport, ReconcileSummary, Reconciler,
    RecordKind, ScoredProject, SkippedRecord,
};
