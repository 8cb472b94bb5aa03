// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between consumers and services
// - Commands accept DTOs, return DTOs
// - Commands convert AppError into ErrorResponse
// - Commands NEVER contain business logic

pub mod plan_commands;

pub use plan_commands::*;
