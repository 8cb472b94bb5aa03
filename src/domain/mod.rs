// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod naming;
pub mod path_safety;
pub mod plan;
pub mod recognition;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Plans
pub use plan::{
    validate_recognize_plan, validate_rename_plan, ExecutionReport, PlanStatus,
    RecognizeMediaFilePlan, RecognizedFile, RejectionReason, RenameFilesPlan, RenameTask,
    TaskResult,
};

// Path safety
pub use path_safety::{
    validate_no_abnormal_paths, validate_no_duplicated_dest_file,
    validate_no_duplicated_source_file, validate_path_within_media_folder,
    validate_rename_tasks, ContainmentCheck, DuplicateCheck, InvalidPath, PathRole,
    PathViolation, ValidationReport,
};

// Recognition
pub use recognition::{CatalogEpisode, CatalogSeason, EpisodeCatalog, EpisodeMatch};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of record invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
