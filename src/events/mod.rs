// src/events/mod.rs
//
// Internal Event System - Public API
//
// EventHandler is internal to the bus module and is not exported.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventLogEntry};

pub use types::{
    ConfirmationRequested, DomainEvent, PlanCompleted, PlanCreated, PlanExecutionPartial,
    PlanKind, PlanRejected,
};

/// Log every terminal plan transition at info level.
pub fn register_audit_handlers(bus: &EventBus) {
    bus.subscribe::<PlanCompleted, _>(|event| {
        log::info!("{:?} plan {} completed", event.kind, event.plan_id);
    });
    bus.subscribe::<PlanRejected, _>(|event| {
        log::info!(
            "{:?} plan {} rejected ({})",
            event.kind,
            event.plan_id,
            event.reason
        );
    });
    bus.subscribe::<PlanExecutionPartial, _>(|event| {
        log::warn!(
            "Plan {} partially applied: {} applied, {} failed",
            event.plan_id,
            event.applied,
            event.failed
        );
    });
}
