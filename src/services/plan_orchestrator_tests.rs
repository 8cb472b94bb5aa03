// src/services/plan_orchestrator_tests.rs
//
// PLAN ORCHESTRATOR TESTS
//
// PURPOSE:
// - Prove that nothing is renamed without an explicit confirmed=true
// - Prove that unsafe plans never reach the consumer
// - Prove that unanswered confirmations reject the plan and release their slot
// - Prove that partial failures stay pending with the per-task report
// - Prove that plans for one folder never execute concurrently

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::confirmation::{ConfirmationChannel, InProcessTransport, OutgoingConfirmation};
use crate::db::open_in_memory_plan_database;
use crate::domain::{PlanStatus, RejectionReason, RenameFilesPlan, RenameTask, TaskResult};
use crate::error::AppError;
use crate::events::EventBus;
use crate::infrastructure::FolderLocks;
use crate::integrations::{MockRenameExecutor, RenameExecutor};
use crate::repositories::{SqliteRecognizePlanRepository, SqliteRenamePlanRepository};
use crate::services::plan_orchestrator::{
    OrchestratorSettings, PlanOrchestrator, PlanOutcome, RecoveryPolicy,
    SubmitRecognitionPlanRequest, SubmitRenamePlanRequest,
};
use crate::services::plan_store::PlanStore;

struct Harness {
    orchestrator: Arc<PlanOrchestrator>,
    store: Arc<PlanStore>,
    channel: Arc<ConfirmationChannel>,
    bus: Arc<EventBus>,
}

fn harness(executor: Arc<dyn RenameExecutor>) -> (Harness, mpsc::Receiver<OutgoingConfirmation>) {
    let pool = Arc::new(open_in_memory_plan_database().unwrap());
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(PlanStore::new(
        Arc::new(SqliteRenamePlanRepository::new(Arc::clone(&pool))),
        Arc::new(SqliteRecognizePlanRepository::new(pool)),
        Arc::clone(&bus),
    ));

    let (transport, rx) = InProcessTransport::new();
    let channel = Arc::new(ConfirmationChannel::new(Arc::new(transport)));

    let orchestrator = Arc::new(PlanOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&channel),
        executor,
        Arc::new(FolderLocks::new()),
        Arc::clone(&bus),
        OrchestratorSettings::default(),
    ));

    (
        Harness {
            orchestrator,
            store,
            channel,
            bus,
        },
        rx,
    )
}

/// Answer every request with `{confirmed}`; returns the number of requests seen
fn respond(
    channel: &Arc<ConfirmationChannel>,
    mut rx: mpsc::Receiver<OutgoingConfirmation>,
    confirmed: bool,
) -> Arc<AtomicUsize> {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let channel = Arc::clone(channel);
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            counter.fetch_add(1, Ordering::SeqCst);
            channel.dispatch(message.correlation_id, json!({ "confirmed": confirmed }));
        }
    });
    seen
}

fn applies_everything() -> MockRenameExecutor {
    let mut executor = MockRenameExecutor::new();
    executor
        .expect_execute()
        .returning(|tasks| tasks.iter().cloned().map(TaskResult::applied).collect());
    executor
}

fn never_executes() -> MockRenameExecutor {
    let mut executor = MockRenameExecutor::new();
    executor.expect_execute().never();
    executor
}

fn rename_request(tasks: Vec<RenameTask>) -> SubmitRenamePlanRequest {
    SubmitRenamePlanRequest {
        media_folder_path: "/media/Show".to_string(),
        files: tasks,
        client_id: None,
        timeout: None,
    }
}

fn scenario_a_tasks() -> Vec<RenameTask> {
    vec![RenameTask::new(
        "/media/Show/ep1.avi",
        "/media/Show/Season 01/Show - S01E01.mp4",
    )]
}

fn event_types(bus: &EventBus) -> Vec<String> {
    bus.get_event_log()
        .into_iter()
        .map(|e| e.event_type)
        .collect()
}

#[cfg(test)]
mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_confirmed_plan_is_applied_and_completed() {
        let (h, rx) = harness(Arc::new(applies_everything()));
        let seen = respond(&h.channel, rx, true);

        let outcome = h
            .orchestrator
            .submit_rename_plan(rename_request(scenario_a_tasks()), &CancellationToken::new())
            .await
            .unwrap();

        let PlanOutcome::Completed { plan_id, results } = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };
        assert_eq!(results, vec![TaskResult::applied(scenario_a_tasks()[0].clone())]);
        assert_eq!(
            h.store.get_rename_plan(plan_id).unwrap().unwrap().status,
            PlanStatus::Completed
        );
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(
            event_types(&h.bus),
            vec!["PlanCreated", "ConfirmationRequested", "PlanCompleted"]
        );
    }

    #[tokio::test]
    async fn test_declined_plan_is_rejected_without_renaming() {
        let (h, rx) = harness(Arc::new(never_executes()));
        respond(&h.channel, rx, false);

        let outcome = h
            .orchestrator
            .submit_rename_plan(rename_request(scenario_a_tasks()), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PlanOutcome::Rejected {
                reason: RejectionReason::UserDeclined,
                ..
            }
        ));
        let stored = h.store.get_rename_plan(outcome.plan_id()).unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Rejected);
        assert_eq!(stored.rejection_reason, Some(RejectionReason::UserDeclined));
    }

    #[tokio::test]
    async fn test_duplicate_destination_never_reaches_consumer() {
        let (h, mut rx) = harness(Arc::new(never_executes()));
        let tasks = vec![
            RenameTask::new("/media/Show/a.mp4", "/media/Show/x.mp4"),
            RenameTask::new("/media/Show/b.mp4", "/media/Show/x.mp4"),
        ];

        let err = h
            .orchestrator
            .submit_rename_plan(rename_request(tasks), &CancellationToken::new())
            .await
            .unwrap_err();

        let AppError::Validation(report) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert_eq!(report.violations.len(), 1);
        assert!(rx.try_recv().is_err());
        assert!(h.store.list_rename_plans(None).unwrap().is_empty());
        assert_eq!(event_types(&h.bus), vec!["PlanRejected"]);
    }

    #[tokio::test]
    async fn test_traversal_destination_is_rejected_before_confirmation() {
        let (h, mut rx) = harness(Arc::new(never_executes()));
        let tasks = vec![RenameTask::new(
            "/media/Show/ep1.avi",
            "/media/Show/../../etc/passwd",
        )];

        let err = h
            .orchestrator
            .submit_rename_plan(rename_request(tasks), &CancellationToken::new())
            .await
            .unwrap_err();

        let AppError::Validation(report) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert!(report.violations.iter().any(|v| matches!(
            v,
            crate::domain::PathViolation::AbnormalPath { path } if path == "/media/Show/../../etc/passwd"
        )));
        assert!(rx.try_recv().is_err());
        assert_eq!(h.channel.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_relative_paths_are_rejected_before_confirmation() {
        let (h, mut rx) = harness(Arc::new(never_executes()));
        let tasks = vec![RenameTask::new("a.mkv", "b.mkv")];

        let err = h
            .orchestrator
            .submit_rename_plan(rename_request(tasks), &CancellationToken::new())
            .await
            .unwrap_err();

        let AppError::Validation(report) = err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert_eq!(
            report.violations,
            vec![
                crate::domain::PathViolation::RelativePath {
                    path: "a.mkv".to_string(),
                    role: crate::domain::path_safety::PathRole::Source,
                },
                crate::domain::PathViolation::RelativePath {
                    path: "b.mkv".to_string(),
                    role: crate::domain::path_safety::PathRole::Destination,
                },
            ]
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(h.channel.pending_count(), 0);
        assert!(h.store.list_rename_plans(None).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_confirmation_times_out_and_rejects() {
        let (h, mut rx) = harness(Arc::new(never_executes()));
        tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let outcome = h
            .orchestrator
            .submit_rename_plan(rename_request(scenario_a_tasks()), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PlanOutcome::Rejected {
                reason: RejectionReason::Timeout,
                ..
            }
        ));
        let stored = h.store.get_rename_plan(outcome.plan_id()).unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Rejected);
        assert_eq!(stored.rejection_reason, Some(RejectionReason::Timeout));
        assert_eq!(h.channel.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_timeouts_leave_no_correlation_records() {
        let (h, mut rx) = harness(Arc::new(never_executes()));
        tokio::spawn(async move { while rx.recv().await.is_some() {} });

        for _ in 0..25 {
            h.orchestrator
                .submit_rename_plan(rename_request(scenario_a_tasks()), &CancellationToken::new())
                .await
                .unwrap();
        }

        assert_eq!(h.channel.pending_count(), 0);
        assert_eq!(
            h.store
                .list_rename_plans(Some(PlanStatus::Rejected))
                .unwrap()
                .len(),
            25
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_rejects_as_aborted() {
        let (h, _rx) = harness(Arc::new(never_executes()));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let outcome = h
            .orchestrator
            .submit_rename_plan(rename_request(scenario_a_tasks()), &cancel)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PlanOutcome::Rejected {
                reason: RejectionReason::Aborted,
                ..
            }
        ));
        assert_eq!(h.channel.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_plan_pending_with_report() {
        let mut executor = MockRenameExecutor::new();
        executor.expect_execute().times(1).returning(|tasks| {
            vec![
                TaskResult::applied(tasks[0].clone()),
                TaskResult::failed(tasks[1].clone(), "permission denied"),
            ]
        });
        let (h, rx) = harness(Arc::new(executor));
        respond(&h.channel, rx, true);

        let tasks = vec![
            RenameTask::new("/media/Show/ep1.avi", "/media/Show/Season 01/Show - S01E01.avi"),
            RenameTask::new("/media/Show/ep2.avi", "/media/Show/Season 01/Show - S01E02.avi"),
        ];
        let err = h
            .orchestrator
            .submit_rename_plan(rename_request(tasks.clone()), &CancellationToken::new())
            .await
            .unwrap_err();

        let AppError::PartialExecution { plan_id, failures } = err else {
            panic!("expected partial execution, got {:?}", err);
        };
        assert_eq!(
            failures,
            vec![TaskResult::failed(tasks[1].clone(), "permission denied")]
        );

        let stored = h.store.get_rename_plan(plan_id).unwrap().unwrap();
        assert_eq!(stored.status, PlanStatus::Pending);
        assert!(stored.needs_follow_up());
        assert_eq!(stored.last_execution.unwrap().results.len(), 2);
    }

    #[tokio::test]
    async fn test_plan_rejected_while_waiting_is_not_applied() {
        let (h, mut rx) = harness(Arc::new(never_executes()));

        let store = Arc::clone(&h.store);
        let channel = Arc::clone(&h.channel);
        tokio::spawn(async move {
            let message = rx.recv().await.unwrap();
            let pending = store.list_rename_plans(Some(PlanStatus::Pending)).unwrap();
            store
                .transition_rename_plan(pending[0].id, PlanStatus::Rejected)
                .unwrap();
            channel.dispatch(message.correlation_id, json!({"confirmed": true}));
        });

        let err = h
            .orchestrator
            .submit_rename_plan(rename_request(scenario_a_tasks()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: PlanStatus::Rejected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_confirmed_recognition_completes_without_renaming() {
        let (h, mut rx) = harness(Arc::new(never_executes()));

        let channel = Arc::clone(&h.channel);
        let events = tokio::spawn(async move {
            let message = rx.recv().await.unwrap();
            channel.dispatch(message.correlation_id, json!({"confirmed": true}));
            message.event
        });

        let outcome = h
            .orchestrator
            .submit_recognition_plan(
                SubmitRecognitionPlanRequest {
                    media_folder_path: "/media/Show".to_string(),
                    files: vec![crate::domain::RecognizedFile::new(1, 1, "/media/Show/ep1.avi")],
                    client_id: Some("ui".to_string()),
                    timeout: None,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(events.await.unwrap(), "askForRecognizeMediaFileConfirmation");
        assert_eq!(
            h.store
                .get_recognize_plan(outcome.plan_id())
                .unwrap()
                .unwrap()
                .status,
            PlanStatus::Completed
        );
    }
}

#[cfg(test)]
mod recovery_tests {
    use super::*;
    use crate::domain::ExecutionReport;

    fn pending_plan(store: &PlanStore) -> RenameFilesPlan {
        store
            .create_rename_plan(RenameFilesPlan::new("/media/Show", scenario_a_tasks()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_expire_rejects_pending_but_keeps_follow_up() {
        let (h, _rx) = harness(Arc::new(never_executes()));
        let stale = pending_plan(&h.store);
        let partial = pending_plan(&h.store);
        h.store
            .record_partial_execution(
                partial.id,
                &ExecutionReport::new(vec![TaskResult::failed(
                    partial.files[0].clone(),
                    "busy",
                )]),
            )
            .unwrap();

        let report = h
            .orchestrator
            .recover_pending(RecoveryPolicy::Expire, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.expired, vec![stale.id]);
        assert_eq!(report.needs_follow_up, vec![partial.id]);

        let expired = h.store.get_rename_plan(stale.id).unwrap().unwrap();
        assert_eq!(expired.status, PlanStatus::Rejected);
        assert_eq!(expired.rejection_reason, Some(RejectionReason::Expired));
        assert_eq!(
            h.store.get_rename_plan(partial.id).unwrap().unwrap().status,
            PlanStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_re_offer_asks_again_before_applying() {
        let (h, rx) = harness(Arc::new(applies_everything()));
        let stale = pending_plan(&h.store);
        let seen = respond(&h.channel, rx, true);

        let report = h
            .orchestrator
            .recover_pending(RecoveryPolicy::ReOffer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.completed, vec![stale.id]);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.store.get_rename_plan(stale.id).unwrap().unwrap().status,
            PlanStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_re_offer_declined_rejects() {
        let (h, rx) = harness(Arc::new(never_executes()));
        let stale = pending_plan(&h.store);
        respond(&h.channel, rx, false);

        let report = h
            .orchestrator
            .recover_pending(RecoveryPolicy::ReOffer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.rejected, vec![stale.id]);
        assert!(report.completed.is_empty());
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    /// Executor that takes time and records how many executions overlap
    #[derive(Default)]
    struct SlowExecutor {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl RenameExecutor for SlowExecutor {
        async fn execute(&self, tasks: &[RenameTask]) -> Vec<TaskResult> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            tasks.iter().cloned().map(TaskResult::applied).collect()
        }
    }

    fn request_for(folder: &str, episode: u32) -> SubmitRenamePlanRequest {
        SubmitRenamePlanRequest {
            media_folder_path: folder.to_string(),
            files: vec![RenameTask::new(
                format!("{}/ep{}.mkv", folder, episode),
                format!("{}/Season 01/Show - S01E{:02}.mkv", folder, episode),
            )],
            client_id: None,
            timeout: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_folder_executions_are_serialized() {
        let executor = Arc::new(SlowExecutor::default());
        let (h, rx) = harness(executor.clone());
        respond(&h.channel, rx, true);
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            h.orchestrator.submit_rename_plan(request_for("/media/Show", 1), &cancel),
            h.orchestrator.submit_rename_plan(request_for("/media/Show", 2), &cancel)
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(executor.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_folders_execute_in_parallel() {
        let executor = Arc::new(SlowExecutor::default());
        let (h, rx) = harness(executor.clone());
        respond(&h.channel, rx, true);
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            h.orchestrator.submit_rename_plan(request_for("/media/ShowA", 1), &cancel),
            h.orchestrator.submit_rename_plan(request_for("/media/ShowB", 1), &cancel)
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(executor.max_active.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_dispatch_does_not_stop_execution() {
        let executor = Arc::new(SlowExecutor::default());
        let (h, rx) = harness(executor.clone());
        respond(&h.channel, rx, true);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let active = Arc::clone(&executor);
        tokio::spawn(async move {
            while active.active.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            trigger.cancel();
        });

        let outcome = h
            .orchestrator
            .submit_rename_plan(request_for("/media/Show", 1), &cancel)
            .await
            .unwrap();

        assert!(cancel.is_cancelled());
        assert!(matches!(outcome, PlanOutcome::Completed { .. }));
    }
}
