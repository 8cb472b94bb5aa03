// src/integrations/mod.rs
//
// External Integrations Module
//
// Collaborators the core only talks to through a trait.

pub mod rename_executor;

pub use rename_executor::{FsRenameExecutor, RenameExecutor};

#[cfg(test)]
pub use rename_executor::MockRenameExecutor;
