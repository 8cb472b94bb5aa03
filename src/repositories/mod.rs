// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement (the PlanStore admits plans)
// - NO event emission
// - Explicit SQL only

pub mod recognize_plan_repository;
pub mod rename_plan_repository;

pub use recognize_plan_repository::{RecognizePlanRepository, SqliteRecognizePlanRepository};
pub use rename_plan_repository::{RenamePlanRepository, SqliteRenamePlanRepository};

/// Wrap a parse failure in a column as a rusqlite conversion error.
pub(crate) fn conversion_error(idx: usize, message: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message.to_string(),
        )),
    )
}
