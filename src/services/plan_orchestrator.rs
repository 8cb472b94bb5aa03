// src/services/plan_orchestrator.rs
//
// Plan Orchestrator
//
// Drives a plan from submission to applied-or-rejected:
//
//   created ──validation fails──▶ rejected (validation, nothing persisted)
//      │
//      ▼
//   pending ──confirmed=false────▶ rejected (user_declined)
//      │    ──timeout / abort────▶ rejected (timeout / aborted)
//      │
//      ▼ confirmed=true
//   execute under folder lock ──all applied──▶ completed
//                             ──some failed──▶ pending + recorded report
//
// CRITICAL RULES:
// - No rename runs without a confirmed=true answer
// - Status changes go through the PlanStore only
// - The folder lock is taken after confirmation and held only while executing
// - Cancellation stops the confirmation wait, never a dispatched execution
// - Timeouts are never retried here; the caller decides
// - Successful renames of a partially failed plan are not rolled back

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::confirmation::{ConfirmationChannel, ConfirmationError, ConfirmationRequest};
use crate::domain::{
    ExecutionReport, PlanStatus, RecognizeMediaFilePlan, RecognizedFile, RejectionReason,
    RenameFilesPlan, RenameTask, TaskResult,
};
use crate::error::{AppError, AppResult};
use crate::events::{ConfirmationRequested, EventBus, PlanKind, PlanRejected};
use crate::infrastructure::FolderLocks;
use crate::integrations::RenameExecutor;
use crate::services::plan_store::PlanStore;

// ============================================================================
// REQUESTS & OUTCOMES
// ============================================================================

#[derive(Debug, Clone)]
pub struct SubmitRenamePlanRequest {
    pub media_folder_path: String,
    pub files: Vec<RenameTask>,
    /// Consumer to ask; the configured default when `None`
    pub client_id: Option<String>,
    /// Confirmation window; the configured default when `None`
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct SubmitRecognitionPlanRequest {
    pub media_folder_path: String,
    pub files: Vec<RecognizedFile>,
    pub client_id: Option<String>,
    pub timeout: Option<Duration>,
}

/// How a submitted plan ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// Confirmed and fully applied. Recognition plans carry no results.
    Completed {
        plan_id: Uuid,
        results: Vec<TaskResult>,
    },
    Rejected {
        plan_id: Uuid,
        reason: RejectionReason,
    },
}

impl PlanOutcome {
    pub fn plan_id(&self) -> Uuid {
        match self {
            PlanOutcome::Completed { plan_id, .. } | PlanOutcome::Rejected { plan_id, .. } => {
                *plan_id
            }
        }
    }
}

/// What to do with plans found `pending` at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Reject every pending plan with reason `expired`
    #[default]
    Expire,
    /// Ask for confirmation again
    ReOffer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryFailure {
    pub plan_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryReport {
    pub expired: Vec<Uuid>,
    pub completed: Vec<Uuid>,
    pub rejected: Vec<Uuid>,
    /// Pending plans with a recorded partial execution; left untouched
    pub needs_follow_up: Vec<Uuid>,
    pub failed: Vec<RecoveryFailure>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub client_id: String,
    pub confirmation_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            client_id: "default".to_string(),
            confirmation_timeout: Duration::from_millis(
                crate::confirmation::DEFAULT_CONFIRMATION_TIMEOUT_MS,
            ),
        }
    }
}

// ============================================================================
// PLAN ORCHESTRATOR
// ============================================================================

pub struct PlanOrchestrator {
    store: Arc<PlanStore>,
    confirmations: Arc<ConfirmationChannel>,
    executor: Arc<dyn RenameExecutor>,
    folder_locks: Arc<FolderLocks>,
    event_bus: Arc<EventBus>,
    settings: OrchestratorSettings,
}

impl PlanOrchestrator {
    pub fn new(
        store: Arc<PlanStore>,
        confirmations: Arc<ConfirmationChannel>,
        executor: Arc<dyn RenameExecutor>,
        folder_locks: Arc<FolderLocks>,
        event_bus: Arc<EventBus>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            confirmations,
            executor,
            folder_locks,
            event_bus,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<PlanStore> {
        &self.store
    }

    /// Validate, persist, confirm and apply a rename plan.
    ///
    /// Errors:
    /// - `Validation`: unsafe input, nothing persisted, no confirmation asked
    /// - `PartialExecution`: some tasks failed; the plan stays pending with
    ///   the per-task report recorded
    pub async fn submit_rename_plan(
        &self,
        request: SubmitRenamePlanRequest,
        cancel: &CancellationToken,
    ) -> AppResult<PlanOutcome> {
        let plan = RenameFilesPlan::new(&request.media_folder_path, request.files);
        let plan_id = plan.id;

        let plan = match self.store.create_rename_plan(plan) {
            Ok(plan) => plan,
            Err(AppError::Validation(report)) => {
                log::warn!("Rename plan {} failed validation: {}", plan_id, report);
                self.event_bus.emit(PlanRejected::new(
                    plan_id,
                    PlanKind::RenameFiles,
                    RejectionReason::Validation.as_str().to_string(),
                ));
                return Err(AppError::Validation(report));
            }
            Err(e) => return Err(e),
        };

        self.confirm_and_apply(&plan, request.client_id, request.timeout, cancel)
            .await
    }

    /// Validate, persist and confirm a recognition plan. Completion touches
    /// no files.
    pub async fn submit_recognition_plan(
        &self,
        request: SubmitRecognitionPlanRequest,
        cancel: &CancellationToken,
    ) -> AppResult<PlanOutcome> {
        let plan = RecognizeMediaFilePlan::new(&request.media_folder_path, request.files);
        let plan_id = plan.id;

        let plan = match self.store.create_recognize_plan(plan) {
            Ok(plan) => plan,
            Err(AppError::Validation(report)) => {
                log::warn!("Recognition plan {} failed validation: {}", plan_id, report);
                self.event_bus.emit(PlanRejected::new(
                    plan_id,
                    PlanKind::RecognizeMediaFile,
                    RejectionReason::Validation.as_str().to_string(),
                ));
                return Err(AppError::Validation(report));
            }
            Err(e) => return Err(e),
        };

        self.confirm_recognition(&plan, request.client_id, request.timeout, cancel)
            .await
    }

    /// Handle plans left `pending` by a previous run.
    ///
    /// Plans with a recorded partial execution are only reported; they are
    /// never expired or applied again.
    pub async fn recover_pending(
        &self,
        policy: RecoveryPolicy,
        cancel: &CancellationToken,
    ) -> AppResult<RecoveryReport> {
        let mut report = RecoveryReport::default();

        for plan in self.store.list_rename_plans(Some(PlanStatus::Pending))? {
            if plan.needs_follow_up() {
                report.needs_follow_up.push(plan.id);
                continue;
            }
            match policy {
                RecoveryPolicy::Expire => {
                    self.store.reject_rename_plan(plan.id, RejectionReason::Expired)?;
                    report.expired.push(plan.id);
                }
                RecoveryPolicy::ReOffer => {
                    let outcome = self.confirm_and_apply(&plan, None, None, cancel).await;
                    record_recovery(&mut report, plan.id, outcome);
                }
            }
        }

        for plan in self.store.list_recognize_plans(Some(PlanStatus::Pending))? {
            match policy {
                RecoveryPolicy::Expire => {
                    self.store
                        .reject_recognize_plan(plan.id, RejectionReason::Expired)?;
                    report.expired.push(plan.id);
                }
                RecoveryPolicy::ReOffer => {
                    let outcome = self.confirm_recognition(&plan, None, None, cancel).await;
                    record_recovery(&mut report, plan.id, outcome);
                }
            }
        }

        log::info!(
            "Recovery ({:?}): {} expired, {} completed, {} rejected, {} need follow-up, {} failed",
            policy,
            report.expired.len(),
            report.completed.len(),
            report.rejected.len(),
            report.needs_follow_up.len(),
            report.failed.len()
        );
        Ok(report)
    }

    // ========================================================================
    // CONFIRMATION & EXECUTION
    // ========================================================================

    async fn confirm_and_apply(
        &self,
        plan: &RenameFilesPlan,
        client_id: Option<String>,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> AppResult<PlanOutcome> {
        let client_id = client_id.unwrap_or_else(|| self.settings.client_id.clone());
        let request = ConfirmationRequest::rename_files(&plan.files, client_id.clone())?;

        match self.ask(plan.id, request, client_id, timeout, cancel).await {
            Ok(true) => {}
            Ok(false) => {
                return self.reject(PlanKind::RenameFiles, plan.id, RejectionReason::UserDeclined)
            }
            Err(e) => return self.resolve_unanswered(PlanKind::RenameFiles, plan.id, e),
        }

        let _folder = self.folder_locks.acquire(&plan.media_folder_path).await;

        // The plan may have been rejected through the query surface while
        // the consumer was deciding.
        let current = self
            .store
            .get_rename_plan(plan.id)?
            .ok_or(AppError::NotFound)?;
        if current.status != PlanStatus::Pending {
            return Err(AppError::InvalidTransition {
                plan_id: plan.id,
                from: current.status,
                to: PlanStatus::Completed,
            });
        }

        log::info!(
            "Applying rename plan {} ({} task(s))",
            plan.id,
            plan.files.len()
        );
        let results = self.executor.execute(&plan.files).await;
        let report = ExecutionReport::new(results);

        if report.all_succeeded() && report.results.len() == plan.files.len() {
            self.store.complete_rename_plan(plan.id)?;
            return Ok(PlanOutcome::Completed {
                plan_id: plan.id,
                results: report.results,
            });
        }

        let failures = missing_results(plan, &report);
        self.store.record_partial_execution(plan.id, &report)?;
        Err(AppError::PartialExecution {
            plan_id: plan.id,
            failures,
        })
    }

    async fn confirm_recognition(
        &self,
        plan: &RecognizeMediaFilePlan,
        client_id: Option<String>,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> AppResult<PlanOutcome> {
        let client_id = client_id.unwrap_or_else(|| self.settings.client_id.clone());
        let request = ConfirmationRequest::recognize_media_file(plan, client_id.clone())?;

        match self.ask(plan.id, request, client_id, timeout, cancel).await {
            Ok(true) => {
                self.store.complete_recognize_plan(plan.id)?;
                Ok(PlanOutcome::Completed {
                    plan_id: plan.id,
                    results: Vec::new(),
                })
            }
            Ok(false) => self.reject(
                PlanKind::RecognizeMediaFile,
                plan.id,
                RejectionReason::UserDeclined,
            ),
            Err(e) => self.resolve_unanswered(PlanKind::RecognizeMediaFile, plan.id, e),
        }
    }

    async fn ask(
        &self,
        plan_id: Uuid,
        request: ConfirmationRequest,
        client_id: String,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<bool, ConfirmationError> {
        let timeout = timeout.unwrap_or(self.settings.confirmation_timeout);
        self.event_bus.emit(ConfirmationRequested::new(
            plan_id,
            client_id,
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ));
        self.confirmations
            .confirm(request, Some(timeout), cancel)
            .await
    }

    /// Timeout and abort reject the plan; other channel failures leave it
    /// pending for recovery and surface the error.
    fn resolve_unanswered(
        &self,
        kind: PlanKind,
        plan_id: Uuid,
        error: ConfirmationError,
    ) -> AppResult<PlanOutcome> {
        match error {
            ConfirmationError::Timeout { .. } => {
                self.reject(kind, plan_id, RejectionReason::Timeout)
            }
            ConfirmationError::Aborted => self.reject(kind, plan_id, RejectionReason::Aborted),
            other => {
                log::error!("Confirmation for plan {} failed: {}", plan_id, other);
                Err(other.into())
            }
        }
    }

    fn reject(
        &self,
        kind: PlanKind,
        plan_id: Uuid,
        reason: RejectionReason,
    ) -> AppResult<PlanOutcome> {
        match kind {
            PlanKind::RenameFiles => self.store.reject_rename_plan(plan_id, reason)?,
            PlanKind::RecognizeMediaFile => self.store.reject_recognize_plan(plan_id, reason)?,
        };
        Ok(PlanOutcome::Rejected { plan_id, reason })
    }
}

/// Failed results, plus a failure for every task the executor did not report.
fn missing_results(plan: &RenameFilesPlan, report: &ExecutionReport) -> Vec<TaskResult> {
    let mut failures = report.failures();
    for task in plan.files.iter().skip(report.results.len()) {
        failures.push(TaskResult::failed(task.clone(), "no result reported by executor"));
    }
    failures
}

fn record_recovery(report: &mut RecoveryReport, plan_id: Uuid, outcome: AppResult<PlanOutcome>) {
    match outcome {
        Ok(PlanOutcome::Completed { .. }) => report.completed.push(plan_id),
        Ok(PlanOutcome::Rejected { .. }) => report.rejected.push(plan_id),
        Err(AppError::PartialExecution { .. }) => report.needs_follow_up.push(plan_id),
        Err(e) => report.failed.push(RecoveryFailure {
            plan_id,
            error: e.to_string(),
        }),
    }
}
