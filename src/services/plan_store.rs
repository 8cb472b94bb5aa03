// src/services/plan_store.rs
//
// PlanStore - owner of plan records and their lifecycle
//
// CRITICAL RULES:
// - The ONLY writer of plan status
// - Admission runs the path-safety checks; nothing invalid is persisted
// - Plans are admitted in `pending`
// - Only pending → completed | rejected, exactly once, by compare-and-set
// - Repeating the same terminal transition succeeds without side effects
// - Lifecycle events are emitted only for transitions that happened

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    validate_recognize_plan, validate_rename_plan, ExecutionReport, PlanStatus,
    RecognizeMediaFilePlan, RejectionReason, RenameFilesPlan,
};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, PlanCompleted, PlanCreated, PlanExecutionPartial, PlanKind, PlanRejected};
use crate::repositories::{RecognizePlanRepository, RenamePlanRepository};

/// Result of a status transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The plan moved from `pending` to the target status
    Applied,
    /// The plan was already in the target status; nothing changed
    AlreadyInState,
}

pub struct PlanStore {
    rename_repo: Arc<dyn RenamePlanRepository>,
    recognize_repo: Arc<dyn RecognizePlanRepository>,
    event_bus: Arc<EventBus>,
}

impl PlanStore {
    pub fn new(
        rename_repo: Arc<dyn RenamePlanRepository>,
        recognize_repo: Arc<dyn RecognizePlanRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            rename_repo,
            recognize_repo,
            event_bus,
        }
    }

    // ========================================================================
    // RENAME PLANS
    // ========================================================================

    /// Validate and persist a rename plan in `pending`.
    ///
    /// Fails with `AppError::Validation` when any path-safety check reports a
    /// violation; nothing is written in that case.
    pub fn create_rename_plan(&self, mut plan: RenameFilesPlan) -> AppResult<RenameFilesPlan> {
        validate_rename_plan(&plan)?;

        plan.status = PlanStatus::Pending;
        plan.rejection_reason = None;
        plan.last_execution = None;

        self.rename_repo.insert(&plan)?;

        log::info!(
            "Rename plan {} admitted for {} ({} task(s))",
            plan.id,
            plan.media_folder_path,
            plan.files.len()
        );
        self.event_bus.emit(PlanCreated::new(
            plan.id,
            PlanKind::RenameFiles,
            plan.media_folder_path.clone(),
            plan.files.len(),
        ));

        Ok(plan)
    }

    pub fn get_rename_plan(&self, id: Uuid) -> AppResult<Option<RenameFilesPlan>> {
        self.rename_repo.get_by_id(id)
    }

    pub fn list_rename_plans(&self, status: Option<PlanStatus>) -> AppResult<Vec<RenameFilesPlan>> {
        self.rename_repo.list(status)
    }

    /// Move a rename plan to `target`. Rejections made through this entry
    /// point are recorded as `manual`.
    pub fn transition_rename_plan(&self, id: Uuid, target: PlanStatus) -> AppResult<TransitionOutcome> {
        let reason = (target == PlanStatus::Rejected).then_some(RejectionReason::Manual);
        self.rename_transition(id, target, reason)
    }

    pub fn complete_rename_plan(&self, id: Uuid) -> AppResult<TransitionOutcome> {
        self.rename_transition(id, PlanStatus::Completed, None)
    }

    pub fn reject_rename_plan(&self, id: Uuid, reason: RejectionReason) -> AppResult<TransitionOutcome> {
        self.rename_transition(id, PlanStatus::Rejected, Some(reason))
    }

    /// Attach a partial execution report to a plan that stays `pending`.
    pub fn record_partial_execution(&self, id: Uuid, report: &ExecutionReport) -> AppResult<()> {
        if !self.rename_repo.record_execution(id, report)? {
            let plan = self.rename_repo.get_by_id(id)?.ok_or(AppError::NotFound)?;
            return Err(AppError::InvalidTransition {
                plan_id: id,
                from: plan.status,
                to: PlanStatus::Pending,
            });
        }

        let failed = report.results.iter().filter(|r| !r.success).count();
        let applied = report.results.len() - failed;
        log::warn!(
            "Rename plan {} needs follow-up: {} applied, {} failed",
            id,
            applied,
            failed
        );
        self.event_bus.emit(PlanExecutionPartial::new(id, applied, failed));
        Ok(())
    }

    fn rename_transition(
        &self,
        id: Uuid,
        target: PlanStatus,
        reason: Option<RejectionReason>,
    ) -> AppResult<TransitionOutcome> {
        self.transition_with(
            PlanKind::RenameFiles,
            id,
            target,
            reason,
            || Ok(self.rename_repo.get_by_id(id)?.map(|p| p.status)),
            || {
                self.rename_repo
                    .compare_and_set_status(id, PlanStatus::Pending, target, reason)
            },
        )
    }

    // ========================================================================
    // RECOGNITION PLANS
    // ========================================================================

    pub fn create_recognize_plan(
        &self,
        mut plan: RecognizeMediaFilePlan,
    ) -> AppResult<RecognizeMediaFilePlan> {
        validate_recognize_plan(&plan)?;

        plan.status = PlanStatus::Pending;
        plan.rejection_reason = None;

        self.recognize_repo.insert(&plan)?;

        log::info!(
            "Recognition plan {} admitted for {} ({} file(s))",
            plan.id,
            plan.media_folder_path,
            plan.files.len()
        );
        self.event_bus.emit(PlanCreated::new(
            plan.id,
            PlanKind::RecognizeMediaFile,
            plan.media_folder_path.clone(),
            plan.files.len(),
        ));

        Ok(plan)
    }

    pub fn get_recognize_plan(&self, id: Uuid) -> AppResult<Option<RecognizeMediaFilePlan>> {
        self.recognize_repo.get_by_id(id)
    }

    pub fn list_recognize_plans(
        &self,
        status: Option<PlanStatus>,
    ) -> AppResult<Vec<RecognizeMediaFilePlan>> {
        self.recognize_repo.list(status)
    }

    pub fn transition_recognize_plan(
        &self,
        id: Uuid,
        target: PlanStatus,
    ) -> AppResult<TransitionOutcome> {
        let reason = (target == PlanStatus::Rejected).then_some(RejectionReason::Manual);
        self.recognize_transition(id, target, reason)
    }

    pub fn complete_recognize_plan(&self, id: Uuid) -> AppResult<TransitionOutcome> {
        self.recognize_transition(id, PlanStatus::Completed, None)
    }

    pub fn reject_recognize_plan(
        &self,
        id: Uuid,
        reason: RejectionReason,
    ) -> AppResult<TransitionOutcome> {
        self.recognize_transition(id, PlanStatus::Rejected, Some(reason))
    }

    fn recognize_transition(
        &self,
        id: Uuid,
        target: PlanStatus,
        reason: Option<RejectionReason>,
    ) -> AppResult<TransitionOutcome> {
        self.transition_with(
            PlanKind::RecognizeMediaFile,
            id,
            target,
            reason,
            || Ok(self.recognize_repo.get_by_id(id)?.map(|p| p.status)),
            || {
                self.recognize_repo
                    .compare_and_set_status(id, PlanStatus::Pending, target, reason)
            },
        )
    }

    // ========================================================================
    // SHARED TRANSITION RULES
    // ========================================================================

    fn transition_with(
        &self,
        kind: PlanKind,
        id: Uuid,
        target: PlanStatus,
        reason: Option<RejectionReason>,
        current_status: impl Fn() -> AppResult<Option<PlanStatus>>,
        compare_and_set: impl Fn() -> AppResult<bool>,
    ) -> AppResult<TransitionOutcome> {
        let current = current_status()?.ok_or(AppError::NotFound)?;

        if !target.is_terminal() {
            return Err(AppError::InvalidTransition {
                plan_id: id,
                from: current,
                to: target,
            });
        }
        if current == target {
            log::debug!("Plan {} already {}", id, target);
            return Ok(TransitionOutcome::AlreadyInState);
        }
        if current != PlanStatus::Pending {
            return Err(AppError::InvalidTransition {
                plan_id: id,
                from: current,
                to: target,
            });
        }

        if !compare_and_set()? {
            // Lost a race with another writer; report what it left behind.
            let now = current_status()?.ok_or(AppError::NotFound)?;
            if now == target {
                return Ok(TransitionOutcome::AlreadyInState);
            }
            return Err(AppError::InvalidTransition {
                plan_id: id,
                from: now,
                to: target,
            });
        }

        match target {
            PlanStatus::Completed => {
                log::info!("Plan {} completed", id);
                self.event_bus.emit(PlanCompleted::new(id, kind));
            }
            _ => {
                let reason = reason.unwrap_or(RejectionReason::Manual);
                log::info!("Plan {} rejected ({})", id, reason);
                self.event_bus
                    .emit(PlanRejected::new(id, kind, reason.as_str().to_string()));
            }
        }

        Ok(TransitionOutcome::Applied)
    }
}
