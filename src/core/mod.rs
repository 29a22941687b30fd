//! Core module - identifiers, extraction, matching, scoring, store seam

pub mod extract;
pub mod identity;
pub mod scoring;
pub mod similarity;
pub mod store;

pub use extract::extract_candidates;
pub use identity::{next_in_scope, IdParseError, WorkId};
pub use scoring::{assess, CompletenessAssessment, CriterionResult, ProjectContext};
pub use similarity::similarity;
pub use store::{MemoryStore, PhaseSeed, ProjectSeed, RecordStore, StoreError};
