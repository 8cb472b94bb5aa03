// src/integrations/rename_executor.rs
//
// Rename-execution collaborator
//
// CRITICAL RULES:
// - Tasks are applied in plan order
// - Every task gets exactly one result; a failure never stops later tasks
// - An existing destination is never overwritten
// - Relative paths are refused, never resolved against the working directory
// - No rollback of tasks that already succeeded

use std::fs;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::path_safety::render_for_platform;
use crate::domain::{RenameTask, TaskResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenameExecutor: Send + Sync {
    /// Apply `tasks` in order and report one result per task
    async fn execute(&self, tasks: &[RenameTask]) -> Vec<TaskResult>;
}

/// Applies renames on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRenameExecutor;

impl FsRenameExecutor {
    pub fn new() -> Self {
        Self
    }

    fn apply(task: &RenameTask) -> Result<(), String> {
        let from = render_for_platform(&task.from);
        let to = render_for_platform(&task.to);

        if !from.has_root() {
            return Err(format!("source path is not absolute: {}", task.from));
        }
        if !to.has_root() {
            return Err(format!("destination path is not absolute: {}", task.to));
        }
        if !from.exists() {
            return Err(format!("source file does not exist: {}", task.from));
        }
        if to.exists() {
            return Err(format!("destination already exists: {}", task.to));
        }

        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_parent(parent)?;
        }

        fs::rename(&from, &to).map_err(|e| format!("rename failed: {}", e))
    }
}

fn create_parent(parent: &Path) -> Result<(), String> {
    fs::create_dir_all(parent)
        .map_err(|e| format!("cannot create {}: {}", parent.display(), e))
}

#[async_trait]
impl RenameExecutor for FsRenameExecutor {
    async fn execute(&self, tasks: &[RenameTask]) -> Vec<TaskResult> {
        let owned = tasks.to_vec();

        let outcome = tokio::task::spawn_blocking(move || {
            owned
                .into_iter()
                .map(|task| match Self::apply(&task) {
                    Ok(()) => {
                        log::debug!("Renamed {} -> {}", task.from, task.to);
                        TaskResult::applied(task)
                    }
                    Err(error) => {
                        log::warn!("Rename {} -> {} failed: {}", task.from, task.to, error);
                        TaskResult::failed(task, error)
                    }
                })
                .collect::<Vec<_>>()
        })
        .await;

        match outcome {
            Ok(results) => results,
            Err(e) => {
                log::error!("Rename worker did not finish: {}", e);
                tasks
                    .iter()
                    .cloned()
                    .map(|task| TaskResult::failed(task, format!("rename worker failed: {}", e)))
                    .collect()
            }
        }
    }
}
