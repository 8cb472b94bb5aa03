// src/application/mod.rs
//
// Application Layer
//
// ARCHITECTURE:
// - Boundary between consumers (CLI, transports) and services
// - Translates between DTOs and domain entities
// - Owns the wiring of services into AppState

pub mod commands;
pub mod dto;
pub mod error_handling;
pub mod state;

pub use dto::*;
pub use error_handling::{ErrorResponse, ErrorType, ToErrorResponse};
pub use state::AppState;
