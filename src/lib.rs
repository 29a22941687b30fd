//! Worktrace: reconciliation core for work-tracking records
//!
//! Links activity-log entries to the projects they mention, scores each
//! project's record completeness, clusters near-duplicate projects,
//! flags orphaned phases, and backfills records for work that exists
//! only in the log. Batch-oriented and deterministic: identical input
//! yields an identical report.

pub mod core;
pub mod engine;
pub mod entities;
