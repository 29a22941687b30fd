//! Collaborator store seam
//!
//! The core never talks to a database or API directly; backfill writes go
//! through [`RecordStore`]. Existence checks and creates are separate
//! calls and are not atomic against concurrent external mutation - the
//! caller owns single-writer discipline across reconciliation runs, and a
//! lost race surfaces as [`StoreError::AlreadyExists`], which the backfill
//! writer reports as a skip rather than an error.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::entities::{Phase, Project, ProjectStatus};

/// Minimal fields for a backfilled project record
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSeed {
    pub project_id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub owner: String,
}

/// Minimal fields for a backfilled phase record
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSeed {
    pub phase_id: String,
    pub name: String,
    pub project_ref: String,
}

/// Errors a collaborator store can report for a single write
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record appeared between the existence check and the write
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// Any other collaborator-side write failure
    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// The only mutating surface the core uses.
///
/// Implementations are expected to be cheap on the existence checks; the
/// backfill writer re-checks immediately before each create.
pub trait RecordStore {
    fn project_exists(&self, project_id: &str) -> bool;

    fn phase_exists(&self, phase_id: &str) -> bool;

    fn create_project(&mut self, seed: ProjectSeed) -> Result<(), StoreError>;

    fn create_phase(&mut self, seed: PhaseSeed) -> Result<(), StoreError>;
}

/// In-memory reference store.
///
/// Useful in tests and for callers that reconcile against records they
/// already hold. Keys are ordered so iteration is deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: BTreeMap<String, ProjectSeed>,
    phases: BTreeMap<String, PhaseSeed>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from already-loaded records
    pub fn from_records(projects: &[Project], phases: &[Phase]) -> Self {
        let mut store = Self::new();
        for p in projects {
            store.projects.insert(
                p.project_id.clone(),
                ProjectSeed {
                    project_id: p.project_id.clone(),
                    name: p.name.clone(),
                    status: p.status,
                    owner: p.owner.clone().unwrap_or_default(),
                },
            );
        }
        for ph in phases {
            store.phases.insert(
                ph.phase_id.clone(),
                PhaseSeed {
                    phase_id: ph.phase_id.clone(),
                    name: ph.name.clone(),
                    project_ref: ph.project_ref.clone().unwrap_or_default(),
                },
            );
        }
        store
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn phase_ids(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    pub fn project(&self, project_id: &str) -> Option<&ProjectSeed> {
        self.projects.get(project_id)
    }

    pub fn phase(&self, phase_id: &str) -> Option<&PhaseSeed> {
        self.phases.get(phase_id)
    }
}

impl RecordStore for MemoryStore {
    fn project_exists(&self, project_id: &str) -> bool {
        self.projects.contains_key(project_id)
    }

    fn phase_exists(&self, phase_id: &str) -> bool {
        self.phases.contains_key(phase_id)
    }

    fn create_project(&mut self, seed: ProjectSeed) -> Result<(), StoreError> {
        if self.projects.contains_key(&seed.project_id) {
            return Err(StoreError::AlreadyExists(seed.project_id));
        }
        self.projects.insert(seed.project_id.clone(), seed);
        Ok(())
    }

    fn create_phase(&mut self, seed: PhaseSeed) -> Result<(), StoreError> {
        if self.phases.contains_key(&seed.phase_id) {
            return Err(StoreError::AlreadyExists(seed.phase_id));
        }
        self.phases.insert(seed.phase_id.clone(), seed);
        Ok(())
    }
}
