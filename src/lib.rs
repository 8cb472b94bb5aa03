// src/lib.rs
// RenameHub - Local-first rename planning and confirmation engine
//
// Architecture:
// - Plans first: nothing on disk changes without a persisted, confirmed plan
// - Explicit: a consumer answers every confirmation, silence rejects
// - Event-driven: services report lifecycle facts through the EventBus
// - Local-first: plans live in a local SQLite file

// ============================================================================
// CORE
// ============================================================================

pub mod config;
pub mod confirmation;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_recognize_plan, validate_rename_plan, validate_rename_tasks, CatalogEpisode,
    CatalogSeason, EpisodeCatalog, EpisodeMatch, ExecutionReport, PathViolation, PlanStatus,
    RecognizeMediaFilePlan, RecognizedFile, RejectionReason, RenameFilesPlan, RenameTask,
    TaskResult, ValidationReport,
};

// ============================================================================
// PUBLIC API - Errors & Config
// ============================================================================

pub use config::EngineConfig;
pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Confirmation
// ============================================================================

pub use confirmation::{
    ConfirmationChannel, ConfirmationError, ConfirmationRequest, ConfirmationResponse,
    ConfirmationTransport, InProcessTransport, OutgoingConfirmation,
};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    register_audit_handlers, ConfirmationRequested, DomainEvent, EventBus, EventLogEntry,
    PlanCompleted, PlanCreated, PlanExecutionPartial, PlanKind, PlanRejected,
};

// ============================================================================
// PUBLIC API - Database & Repositories
// ============================================================================

pub use db::{open_in_memory_plan_database, open_plan_database, ConnectionPool};

pub use repositories::{
    RecognizePlanRepository, RenamePlanRepository, SqliteRecognizePlanRepository,
    SqliteRenamePlanRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    match_episodes, EpisodeMatcher, MatchRules, OrchestratorSettings, PlanOrchestrator,
    PlanOutcome, PlanStore, RecoveryPolicy, RecoveryReport, SubmitRecognitionPlanRequest,
    SubmitRenamePlanRequest, TransitionOutcome,
};

pub use infrastructure::{scan_media_folder, FolderLocks};
pub use integrations::{FsRenameExecutor, RenameExecutor};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, ErrorResponse, ErrorType};
