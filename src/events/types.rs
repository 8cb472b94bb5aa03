// src/events/types.rs
//
// Plan lifecycle events.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

/// Kind of plan an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    RenameFiles,
    RecognizeMediaFile,
}

// ============================================================================
// PLAN LIFECYCLE EVENTS
// ============================================================================

/// Emitted when a plan is admitted in `pending`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub plan_id: Uuid,
    pub kind: PlanKind,
    pub media_folder_path: String,
    pub file_count: usize,
}

impl PlanCreated {
    pub fn new(plan_id: Uuid, kind: PlanKind, media_folder_path: String, file_count: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            plan_id,
            kind,
            media_folder_path,
            file_count,
        }
    }
}

impl DomainEvent for PlanCreated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "PlanCreated" }
}

/// Emitted when a plan is offered to a consumer for confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRequested {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub plan_id: Uuid,
    pub client_id: String,
    pub timeout_ms: u64,
}

impl ConfirmationRequested {
    pub fn new(plan_id: Uuid, client_id: String, timeout_ms: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            plan_id,
            client_id,
            timeout_ms,
        }
    }
}

impl DomainEvent for ConfirmationRequested {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ConfirmationRequested" }
}

/// Emitted once when a plan reaches `completed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub plan_id: Uuid,
    pub kind: PlanKind,
}

impl PlanCompleted {
    pub fn new(plan_id: Uuid, kind: PlanKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            plan_id,
            kind,
        }
    }
}

impl DomainEvent for PlanCompleted {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "PlanCompleted" }
}

/// Emitted once when a plan reaches `rejected`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRejected {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub plan_id: Uuid,
    pub kind: PlanKind,
    pub reason: String,
}

impl PlanRejected {
    pub fn new(plan_id: Uuid, kind: PlanKind, reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            plan_id,
            kind,
            reason,
        }
    }
}

impl DomainEvent for PlanRejected {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "PlanRejected" }
}

/// Emitted when some tasks of a confirmed plan failed to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExecutionPartial {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub plan_id: Uuid,
    pub applied: usize,
    pub failed: usize,
}

impl PlanExecutionPartial {
    pub fn new(plan_id: Uuid, applied: usize, failed: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            plan_id,
            applied,
            failed,
        }
    }
}

impl DomainEvent for PlanExecutionPartial {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "PlanExecutionPartial" }
}
