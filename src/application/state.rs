// src/application/state.rs
//
// Application state shared by every command.
// All fields are Arc-wrapped; nothing here is a process-wide singleton.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::confirmation::{ConfirmationChannel, ConfirmationTransport};
use crate::db::{get_connection, get_database_stats, ConnectionPool, DatabaseStats};
use crate::error::AppResult;
use crate::events::{register_audit_handlers, EventBus};
use crate::infrastructure::FolderLocks;
use crate::integrations::RenameExecutor;
use crate::repositories::{SqliteRecognizePlanRepository, SqliteRenamePlanRepository};
use crate::services::{PlanOrchestrator, PlanStore};

pub struct AppState {
    pub config: EngineConfig,
    pub event_bus: Arc<EventBus>,
    pub plan_store: Arc<PlanStore>,
    pub confirmations: Arc<ConfirmationChannel>,
    pub orchestrator: Arc<PlanOrchestrator>,
    pool: Arc<ConnectionPool>,
}

impl AppState {
    /// Wire repositories, services and the confirmation channel over `pool`.
    pub fn build(
        config: EngineConfig,
        pool: ConnectionPool,
        transport: Arc<dyn ConfirmationTransport>,
        executor: Arc<dyn RenameExecutor>,
    ) -> Self {
        let pool = Arc::new(pool);
        let event_bus = Arc::new(EventBus::new());
        register_audit_handlers(&event_bus);

        let plan_store = Arc::new(PlanStore::new(
            Arc::new(SqliteRenamePlanRepository::new(Arc::clone(&pool))),
            Arc::new(SqliteRecognizePlanRepository::new(Arc::clone(&pool))),
            Arc::clone(&event_bus),
        ));

        let confirmations = Arc::new(ConfirmationChannel::with_timeout(
            transport,
            config.confirmation_timeout(),
        ));

        let orchestrator = Arc::new(PlanOrchestrator::new(
            Arc::clone(&plan_store),
            Arc::clone(&confirmations),
            executor,
            Arc::new(FolderLocks::new()),
            Arc::clone(&event_bus),
            config.orchestrator_settings(),
        ));

        Self {
            config,
            event_bus,
            plan_store,
            confirmations,
            orchestrator,
            pool,
        }
    }

    /// Plan counts per table and status
    pub fn database_stats(&self) -> AppResult<DatabaseStats> {
        let conn = get_connection(&self.pool)?;
        get_database_stats(&conn)
    }

    /// Open the configured database (creating and migrating it) and wire
    /// everything on top of it.
    pub fn open(
        config: EngineConfig,
        transport: Arc<dyn ConfirmationTransport>,
        executor: Arc<dyn RenameExecutor>,
    ) -> AppResult<Self> {
        let db_path = config.resolved_database_path()?;
        log::info!("Using plan database at {}", db_path.display());
        let pool = crate::db::open_plan_database(&db_path)?;
        Ok(Self::build(config, pool, transport, executor))
    }
}
