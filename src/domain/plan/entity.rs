use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::path_safety::to_posix;
use crate::domain::DomainError;

/// A single file move inside a media folder.
/// Both paths are kept in POSIX form; rendering for the platform happens at
/// the filesystem boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenameTask {
    pub from: String,
    pub to: String,
}

impl RenameTask {
    pub fn new(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        Self {
            from: to_posix(from.as_ref()),
            to: to_posix(to.as_ref()),
        }
    }
}

/// Lifecycle of every plan type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Completed,
    Rejected,
}

impl PlanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlanStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Completed => "completed",
            PlanStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlanStatus::Pending),
            "completed" => Ok(PlanStatus::Completed),
            "rejected" => Ok(PlanStatus::Rejected),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown plan status: {}",
                other
            ))),
        }
    }
}

/// Why a plan ended in `rejected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Path safety checks failed
    Validation,
    /// The consumer answered `confirmed: false`
    UserDeclined,
    /// No answer within the confirmation window
    Timeout,
    /// The caller cancelled the confirmation wait
    Aborted,
    /// Left pending across a restart and expired by recovery
    Expired,
    /// Rejected through the plan query surface
    Manual,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Validation => "validation",
            RejectionReason::UserDeclined => "user_declined",
            RejectionReason::Timeout => "timeout",
            RejectionReason::Aborted => "aborted",
            RejectionReason::Expired => "expired",
            RejectionReason::Manual => "manual",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectionReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(RejectionReason::Validation),
            "user_declined" => Ok(RejectionReason::UserDeclined),
            "timeout" => Ok(RejectionReason::Timeout),
            "aborted" => Ok(RejectionReason::Aborted),
            "expired" => Ok(RejectionReason::Expired),
            "manual" => Ok(RejectionReason::Manual),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown rejection reason: {}",
                other
            ))),
        }
    }
}

/// Per-task outcome reported by the rename executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: RenameTask,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn applied(task: RenameTask) -> Self {
        Self {
            task,
            success: true,
            error: None,
        }
    }

    pub fn failed(task: RenameTask, error: impl Into<String>) -> Self {
        Self {
            task,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Recorded outcome of an execution attempt that did not fully succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub results: Vec<TaskResult>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReport {
    pub fn new(results: Vec<TaskResult>) -> Self {
        Self {
            results,
            executed_at: Utc::now(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn failures(&self) -> Vec<TaskResult> {
        self.results.iter().filter(|r| !r.success).cloned().collect()
    }
}

/// A pending or decided set of file moves under one media folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameFilesPlan {
    pub id: Uuid,
    pub status: PlanStatus,
    pub media_folder_path: String,
    pub files: Vec<RenameTask>,
    pub rejection_reason: Option<RejectionReason>,
    /// Set when an execution left some tasks unapplied
    pub last_execution: Option<ExecutionReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RenameFilesPlan {
    /// Create a new plan in `pending`. Admission checks run in the PlanStore.
    pub fn new(media_folder_path: impl AsRef<str>, files: Vec<RenameTask>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: PlanStatus::Pending,
            media_folder_path: to_posix(media_folder_path.as_ref()),
            files,
            rejection_reason: None,
            last_execution: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn needs_follow_up(&self) -> bool {
        self.status == PlanStatus::Pending && self.last_execution.is_some()
    }
}

/// A file labelled with its season and episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedFile {
    pub season: u32,
    pub episode: u32,
    pub path: String,
}

impl RecognizedFile {
    pub fn new(season: u32, episode: u32, path: impl AsRef<str>) -> Self {
        Self {
            season,
            episode,
            path: to_posix(path.as_ref()),
        }
    }
}

/// Recognition (labelling) plan, confirmed separately from renaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizeMediaFilePlan {
    pub id: Uuid,
    pub status: PlanStatus,
    pub media_folder_path: String,
    pub files: Vec<RecognizedFile>,
    pub rejection_reason: Option<RejectionReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecognizeMediaFilePlan {
    pub const TASK: &'static str = "recognize-media-file";

    pub fn new(media_folder_path: impl AsRef<str>, files: Vec<RecognizedFile>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: PlanStatus::Pending,
            media_folder_path: to_posix(media_folder_path.as_ref()),
            files,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
