// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are consumer-friendly representations
// - Paths are rendered for the running platform
// - DTOs are simple, serializable structs
// - Conversion FROM domain entities only (never TO), except submission input

use serde::{Deserialize, Serialize};

use crate::db::DatabaseStats;
use crate::domain::path_safety::render_for_platform;
use crate::domain::{
    EpisodeCatalog, EpisodeMatch, ExecutionReport, RecognizeMediaFilePlan, RecognizedFile, RenameFilesPlan,
    RenameTask, TaskResult,
};

fn rendered(path: &str) -> String {
    render_for_platform(path).to_string_lossy().into_owned()
}

// ============================================================================
// RENAME PLAN DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTaskDto {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResultDto {
    pub from: String,
    pub to: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReportDto {
    pub results: Vec<TaskResultDto>,
    pub executed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlanDto {
    pub id: String,
    pub status: String,
    pub media_folder_path: String,
    pub files: Vec<RenameTaskDto>,
    pub rejection_reason: Option<String>,
    pub needs_follow_up: bool,
    pub last_execution: Option<ExecutionReportDto>,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// RECOGNITION PLAN DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedFileDto {
    pub season: u32,
    pub episode: u32,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizePlanDto {
    pub id: String,
    pub task: String,
    pub status: String,
    pub media_folder_path: String,
    pub files: Vec<RecognizedFileDto>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// QUERY SURFACE DTOs
// ============================================================================

/// Either kind of plan, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanDto {
    RenameFiles(RenamePlanDto),
    RecognizeMediaFile(RecognizePlanDto),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListDto {
    pub rename_plans: Vec<RenamePlanDto>,
    pub recognize_plans: Vec<RecognizePlanDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResultDto {
    pub plan_id: String,
    pub status: String,
    /// False when the plan was already in the requested state
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatsDto {
    pub rename_plans: i64,
    pub pending_rename_plans: i64,
    pub recognize_plans: i64,
    pub pending_recognize_plans: i64,
}

// ============================================================================
// SUBMISSION DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRenamePlanDto {
    pub media_folder_path: String,
    pub files: Vec<RenameTaskDto>,
    pub client_id: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRecognitionPlanDto {
    pub media_folder_path: String,
    pub files: Vec<RecognizedFileDto>,
    pub client_id: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Scan a folder and propose canonical names for the episodes it contains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRenamePreviewDto {
    pub media_folder_path: String,
    pub show_name: String,
    pub catalog: EpisodeCatalog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRenamePreviewResultDto {
    pub media_folder_path: String,
    pub matches: Vec<EpisodeMatch>,
    /// Files already at their canonical name produce no task
    pub files: Vec<RenameTaskDto>,
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<&RenameTask> for RenameTaskDto {
    fn from(task: &RenameTask) -> Self {
        Self {
            from: rendered(&task.from),
            to: rendered(&task.to),
        }
    }
}

impl From<&RenameTaskDto> for RenameTask {
    fn from(dto: &RenameTaskDto) -> Self {
        RenameTask::new(&dto.from, &dto.to)
    }
}

impl From<&TaskResult> for TaskResultDto {
    fn from(result: &TaskResult) -> Self {
        Self {
            from: rendered(&result.task.from),
            to: rendered(&result.task.to),
            success: result.success,
            error: result.error.clone(),
        }
    }
}

impl From<&ExecutionReport> for ExecutionReportDto {
    fn from(report: &ExecutionReport) -> Self {
        Self {
            results: report.results.iter().map(TaskResultDto::from).collect(),
            executed_at: report.executed_at.to_rfc3339(),
        }
    }
}

impl From<RenameFilesPlan> for RenamePlanDto {
    fn from(plan: RenameFilesPlan) -> Self {
        Self {
            id: plan.id.to_string(),
            status: plan.status.to_string(),
            needs_follow_up: plan.needs_follow_up(),
            media_folder_path: rendered(&plan.media_folder_path),
            files: plan.files.iter().map(RenameTaskDto::from).collect(),
            rejection_reason: plan.rejection_reason.map(|r| r.to_string()),
            last_execution: plan.last_execution.as_ref().map(ExecutionReportDto::from),
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
        }
    }
}

impl From<DatabaseStats> for DatabaseStatsDto {
    fn from(stats: DatabaseStats) -> Self {
        Self {
            rename_plans: stats.rename_plans,
            pending_rename_plans: stats.pending_rename_plans,
            recognize_plans: stats.recognize_plans,
            pending_recognize_plans: stats.pending_recognize_plans,
        }
    }
}

impl From<&RecognizedFile> for RecognizedFileDto {
    fn from(file: &RecognizedFile) -> Self {
        Self {
            season: file.season,
            episode: file.episode,
            path: rendered(&file.path),
        }
    }
}

impl From<&RecognizedFileDto> for RecognizedFile {
    fn from(dto: &RecognizedFileDto) -> Self {
        RecognizedFile::new(dto.season, dto.episode, &dto.path)
    }
}

impl From<RecognizeMediaFilePlan> for RecognizePlanDto {
    fn from(plan: RecognizeMediaFilePlan) -> Self {
        Self {
            id: plan.id.to_string(),
            task: RecognizeMediaFilePlan::TASK.to_string(),
            status: plan.status.to_string(),
            media_folder_path: rendered(&plan.media_folder_path),
            files: plan.files.iter().map(RecognizedFileDto::from).collect(),
            rejection_reason: plan.rejection_reason.map(|r| r.to_string()),
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_plan_dto_is_camel_case() {
        let plan = RenameFilesPlan::new(
            "/media/Show",
            vec![RenameTask::new("/media/Show/a.mkv", "/media/Show/b.mkv")],
        );
        let json = serde_json::to_value(RenamePlanDto::from(plan)).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["mediaFolderPath"], "/media/Show");
        assert_eq!(json["needsFollowUp"], false);
        assert_eq!(json["files"][0]["to"], "/media/Show/b.mkv");
    }

    #[test]
    fn test_plan_dto_is_tagged_by_kind() {
        let plan = RecognizeMediaFilePlan::new(
            "/media/Show",
            vec![RecognizedFile::new(1, 1, "/media/Show/e1.mkv")],
        );
        let json = serde_json::to_value(PlanDto::RecognizeMediaFile(plan.into())).unwrap();

        assert_eq!(json["kind"], "recognize_media_file");
        assert_eq!(json["task"], "recognize-media-file");
    }
}
