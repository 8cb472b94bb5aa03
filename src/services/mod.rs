// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod episode_matcher;
pub mod plan_orchestrator;
pub mod plan_store;

#[cfg(test)]
mod plan_orchestrator_tests;

// Re-export all services and their types
pub use episode_matcher::{match_episodes, EpisodeMatcher, MatchRules};

pub use plan_orchestrator::{
    OrchestratorSettings, PlanOrchestrator, PlanOutcome, RecoveryFailure, RecoveryPolicy,
    RecoveryReport, SubmitRecognitionPlanRequest, SubmitRenamePlanRequest,
};

pub use plan_store::{PlanStore, TransitionOutcome};
