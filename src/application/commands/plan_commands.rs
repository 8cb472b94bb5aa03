// src/application/commands/plan_commands.rs
//
// Plan Command Handlers
//
// RULES:
// - Accept DTOs and plain identifiers
// - Call services
// - Return DTOs or ErrorResponse
// - Never contain business logic

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::dto::*;
use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::state::AppState;
use crate::domain::naming::rename_tasks_for_matches;
use crate::domain::{PlanStatus, RejectionReason};
use crate::infrastructure::scan_media_folder;
use crate::services::{
    EpisodeMatcher, MatchRules, PlanOutcome, RecoveryPolicy, RecoveryReport,
    SubmitRecognitionPlanRequest, SubmitRenamePlanRequest, TransitionOutcome,
};

type CommandResult<T> = Result<T, ErrorResponse>;

fn parse_plan_id(plan_id: &str) -> CommandResult<Uuid> {
    Uuid::parse_str(plan_id)
        .map_err(|e| ErrorResponse::validation(format!("Invalid plan id: {}", e)))
}

fn parse_status(status: Option<&str>) -> CommandResult<Option<PlanStatus>> {
    status
        .map(PlanStatus::from_str)
        .transpose()
        .map_err(|e| ErrorResponse::validation(e.to_string()))
}

fn transition_result(plan_id: Uuid, status: PlanStatus, outcome: TransitionOutcome) -> TransitionResultDto {
    TransitionResultDto {
        plan_id: plan_id.to_string(),
        status: status.to_string(),
        changed: outcome == TransitionOutcome::Applied,
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// Plans of both kinds, optionally filtered by status
pub fn list_plans(state: &AppState, status: Option<&str>) -> CommandResult<PlanListDto> {
    let status = parse_status(status)?;
    let store = &state.plan_store;

    let rename_plans = store.list_rename_plans(status).to_error_response()?;
    let recognize_plans = store.list_recognize_plans(status).to_error_response()?;

    Ok(PlanListDto {
        rename_plans: rename_plans.into_iter().map(RenamePlanDto::from).collect(),
        recognize_plans: recognize_plans.into_iter().map(RecognizePlanDto::from).collect(),
    })
}

pub fn list_pending_plans(state: &AppState) -> CommandResult<PlanListDto> {
    list_plans(state, Some(PlanStatus::Pending.as_str()))
}

/// Look a plan up by id in either table
pub fn get_plan(state: &AppState, plan_id: &str) -> CommandResult<PlanDto> {
    let id = parse_plan_id(plan_id)?;
    let store = &state.plan_store;

    if let Some(plan) = store.get_rename_plan(id).to_error_response()? {
        return Ok(PlanDto::RenameFiles(plan.into()));
    }
    if let Some(plan) = store.get_recognize_plan(id).to_error_response()? {
        return Ok(PlanDto::RecognizeMediaFile(plan.into()));
    }
    Err(ErrorResponse::not_found("Plan"))
}

/// Plan counts per kind and status
pub fn database_stats(state: &AppState) -> CommandResult<DatabaseStatsDto> {
    state
        .database_stats()
        .map(DatabaseStatsDto::from)
        .to_error_response()
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Reject a pending plan with reason `manual`
pub fn reject_plan(state: &AppState, plan_id: &str) -> CommandResult<TransitionResultDto> {
    let id = parse_plan_id(plan_id)?;
    let store = &state.plan_store;

    let outcome = if store.get_rename_plan(id).to_error_response()?.is_some() {
        store.reject_rename_plan(id, RejectionReason::Manual)
    } else {
        store.reject_recognize_plan(id, RejectionReason::Manual)
    }
    .to_error_response()?;

    Ok(transition_result(id, PlanStatus::Rejected, outcome))
}

/// Mark a pending plan completed without touching any file.
/// Used to close out a plan whose remaining moves were finished by hand.
pub fn complete_plan(state: &AppState, plan_id: &str) -> CommandResult<TransitionResultDto> {
    let id = parse_plan_id(plan_id)?;
    let store = &state.plan_store;

    let outcome = if store.get_rename_plan(id).to_error_response()?.is_some() {
        store.complete_rename_plan(id)
    } else {
        store.complete_recognize_plan(id)
    }
    .to_error_response()?;

    Ok(transition_result(id, PlanStatus::Completed, outcome))
}

/// Run startup recovery with the given policy, or the configured one
pub async fn recover_pending_plans(
    state: &AppState,
    policy: Option<RecoveryPolicy>,
    cancel: &CancellationToken,
) -> CommandResult<RecoveryReport> {
    let policy = policy.unwrap_or(state.config.recovery);
    state
        .orchestrator
        .recover_pending(policy, cancel)
        .await
        .to_error_response()
}

pub async fn expire_pending_plans(state: &AppState) -> CommandResult<RecoveryReport> {
    recover_pending_plans(state, Some(RecoveryPolicy::Expire), &CancellationToken::new()).await
}

// ============================================================================
// SUBMISSION
// ============================================================================

pub async fn submit_rename_plan(
    state: &AppState,
    dto: SubmitRenamePlanDto,
    cancel: &CancellationToken,
) -> CommandResult<PlanOutcome> {
    let request = SubmitRenamePlanRequest {
        media_folder_path: dto.media_folder_path,
        files: dto.files.iter().map(Into::into).collect(),
        client_id: dto.client_id,
        timeout: dto.timeout_ms.map(Duration::from_millis),
    };

    state
        .orchestrator
        .submit_rename_plan(request, cancel)
        .await
        .to_error_response()
}

pub async fn submit_recognition_plan(
    state: &AppState,
    dto: SubmitRecognitionPlanDto,
    cancel: &CancellationToken,
) -> CommandResult<PlanOutcome> {
    let request = SubmitRecognitionPlanRequest {
        media_folder_path: dto.media_folder_path,
        files: dto.files.iter().map(Into::into).collect(),
        client_id: dto.client_id,
        timeout: dto.timeout_ms.map(Duration::from_millis),
    };

    state
        .orchestrator
        .submit_recognition_plan(request, cancel)
        .await
        .to_error_response()
}

// ============================================================================
// EPISODE RENAMES
// ============================================================================

/// Scan a media folder, match its files against the catalog and propose
/// canonical destinations. Nothing is persisted.
pub async fn preview_episode_renames(
    state: &AppState,
    dto: &EpisodeRenamePreviewDto,
) -> CommandResult<EpisodeRenamePreviewResultDto> {
    let folder = dto.media_folder_path.clone();
    let extensions = state.config.video_extensions.clone();

    let files = tokio::task::spawn_blocking(move || {
        scan_media_folder(Path::new(&folder), &extensions)
    })
    .await
    .map_err(|e| ErrorResponse::from_app_error(crate::error::AppError::Other(e.to_string())))?
    .to_error_response()?;

    let rules = MatchRules::default();
    let matches = EpisodeMatcher::with_rules(
        &dto.catalog,
        &files,
        &rules,
        &state.config.video_extensions,
    )
    .matches();
    let tasks = rename_tasks_for_matches(&dto.media_folder_path, &dto.show_name, &matches);

    log::debug!(
        "Preview for {}: {} file(s), {} match(es), {} rename(s)",
        dto.media_folder_path,
        files.len(),
        matches.len(),
        tasks.len()
    );

    Ok(EpisodeRenamePreviewResultDto {
        media_folder_path: dto.media_folder_path.clone(),
        matches,
        files: tasks.iter().map(RenameTaskDto::from).collect(),
    })
}

/// Preview, then submit the proposed renames as one plan
pub async fn apply_episode_renames(
    state: &AppState,
    dto: &EpisodeRenamePreviewDto,
    client_id: Option<String>,
    cancel: &CancellationToken,
) -> CommandResult<PlanOutcome> {
    let preview = preview_episode_renames(state, dto).await?;
    if preview.files.is_empty() {
        return Err(ErrorResponse::validation("Nothing to rename"));
    }

    submit_rename_plan(
        state,
        SubmitRenamePlanDto {
            media_folder_path: dto.media_folder_path.clone(),
            files: preview.files,
            client_id,
            timeout_ms: None,
        },
        cancel,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::error_handling::ErrorType;
    use crate::config::EngineConfig;
    use crate::confirmation::InProcessTransport;
    use crate::db::open_in_memory_plan_database;
    use crate::domain::{CatalogSeason, EpisodeCatalog, RecognizeMediaFilePlan, RecognizedFile, RenameFilesPlan, RenameTask};
    use crate::integrations::FsRenameExecutor;
    use tempfile::TempDir;

    fn state() -> AppState {
        let (transport, _rx) = InProcessTransport::new();
        AppState::build(
            EngineConfig::default(),
            open_in_memory_plan_database().unwrap(),
            Arc::new(transport),
            Arc::new(FsRenameExecutor),
        )
    }

    fn pending_rename_plan(state: &AppState) -> RenameFilesPlan {
        state
            .plan_store
            .create_rename_plan(RenameFilesPlan::new(
                "/media/Show",
                vec![RenameTask::new("/media/Show/a.mkv", "/media/Show/b.mkv")],
            ))
            .unwrap()
    }

    #[test]
    fn test_list_pending_plans_covers_both_kinds() {
        let state = state();
        pending_rename_plan(&state);
        state
            .plan_store
            .create_recognize_plan(RecognizeMediaFilePlan::new(
                "/media/Show",
                vec![RecognizedFile::new(1, 1, "/media/Show/e1.mkv")],
            ))
            .unwrap();

        let pending = list_pending_plans(&state).unwrap();
        assert_eq!(pending.rename_plans.len(), 1);
        assert_eq!(pending.recognize_plans.len(), 1);
    }

    #[test]
    fn test_database_stats_counts_pending_and_settled_plans() {
        let state = state();
        let first = pending_rename_plan(&state);
        pending_rename_plan(&state);
        reject_plan(&state, &first.id.to_string()).unwrap();

        let stats = database_stats(&state).unwrap();
        assert_eq!(
            stats,
            DatabaseStatsDto {
                rename_plans: 2,
                pending_rename_plans: 1,
                recognize_plans: 0,
                pending_recognize_plans: 0,
            }
        );
    }

    #[test]
    fn test_unknown_status_filter_is_a_validation_error() {
        let state = state();
        let error = list_plans(&state, Some("archived")).unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[test]
    fn test_get_plan_finds_rename_plan() {
        let state = state();
        let plan = pending_rename_plan(&state);

        match get_plan(&state, &plan.id.to_string()).unwrap() {
            PlanDto::RenameFiles(dto) => assert_eq!(dto.id, plan.id.to_string()),
            other => panic!("unexpected plan: {:?}", other),
        }
    }

    #[test]
    fn test_get_plan_unknown_id() {
        let state = state();
        let error = get_plan(&state, &Uuid::new_v4().to_string()).unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound);

        let error = get_plan(&state, "not-a-uuid").unwrap_err();
        assert_eq!(error.error_type, ErrorType::Validation);
    }

    #[test]
    fn test_reject_plan_twice_reports_no_change() {
        let state = state();
        let plan = pending_rename_plan(&state);
        let id = plan.id.to_string();

        let first = reject_plan(&state, &id).unwrap();
        assert!(first.changed);
        assert_eq!(first.status, "rejected");

        let second = reject_plan(&state, &id).unwrap();
        assert!(!second.changed);

        let stored = state.plan_store.get_rename_plan(plan.id).unwrap().unwrap();
        assert_eq!(stored.rejection_reason, Some(RejectionReason::Manual));
    }

    #[test]
    fn test_complete_rejected_plan_is_invalid() {
        let state = state();
        let plan = pending_rename_plan(&state);
        reject_plan(&state, &plan.id.to_string()).unwrap();

        let error = complete_plan(&state, &plan.id.to_string()).unwrap_err();
        assert_eq!(error.error_type, ErrorType::InvalidTransition);
    }

    #[tokio::test]
    async fn test_expire_pending_plans() {
        let state = state();
        let plan = pending_rename_plan(&state);

        let report = expire_pending_plans(&state).await.unwrap();
        assert_eq!(report.expired, vec![plan.id]);
        assert!(list_pending_plans(&state).unwrap().rename_plans.is_empty());
    }

    #[tokio::test]
    async fn test_unsafe_submission_is_refused() {
        let state = state();
        let error = submit_rename_plan(
            &state,
            SubmitRenamePlanDto {
                media_folder_path: "/media/Show".to_string(),
                files: vec![RenameTaskDto {
                    from: "/media/Show/a.mkv".to_string(),
                    to: "/etc/passwd".to_string(),
                }],
                client_id: None,
                timeout_ms: None,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(error.error_type, ErrorType::Validation);
        assert!(list_plans(&state, None).unwrap().rename_plans.is_empty());
    }

    #[tokio::test]
    async fn test_preview_episode_renames() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Show - 01.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("Show - 02.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let state = state();
        let folder = dir.path().to_string_lossy().into_owned();
        let preview = preview_episode_renames(
            &state,
            &EpisodeRenamePreviewDto {
                media_folder_path: folder.clone(),
                show_name: "Show".to_string(),
                catalog: EpisodeCatalog::new(vec![CatalogSeason::numbered(1, 3)]),
            },
        )
        .await
        .unwrap();

        assert_eq!(preview.matches.len(), 2);
        assert_eq!(preview.files.len(), 2);
        assert!(preview.files.iter().all(|t| t.to.contains("Season 01")));
        assert!(list_plans(&state, None).unwrap().rename_plans.is_empty());
    }
}
