// src/repositories/rename_plan_repository.rs
//
// Rename Plan Repository
//
// - All parse failures are explicit errors, never silent defaults
// - Uses ConnectionPool for thread safety
// - Plan header and ordered tasks are written in one transaction

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::conversion_error;
use crate::db::{get_connection, ConnectionPool};
use crate::domain::{ExecutionReport, PlanStatus, RejectionReason, RenameFilesPlan, RenameTask};
use crate::error::AppResult;

pub trait RenamePlanRepository: Send + Sync {
    /// Insert a new plan with its ordered tasks
    fn insert(&self, plan: &RenameFilesPlan) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<RenameFilesPlan>>;

    /// List plans, oldest first, optionally filtered by status
    fn list(&self, status: Option<PlanStatus>) -> AppResult<Vec<RenameFilesPlan>>;

    /// Move a plan from `expected` to `target`.
    /// Returns false when the stored status was not `expected`.
    fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PlanStatus,
        target: PlanStatus,
        reason: Option<RejectionReason>,
    ) -> AppResult<bool>;

    /// Record a partial execution on a still-pending plan
    fn record_execution(&self, id: Uuid, report: &ExecutionReport) -> AppResult<bool>;
}

pub struct SqliteRenamePlanRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteRenamePlanRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Convert a plan header row (without tasks) to a RenameFilesPlan.
    fn row_to_plan(row: &Row) -> rusqlite::Result<RenameFilesPlan> {
        let id_str: String = row.get("id")?;
        let status_str: String = row.get("status")?;
        let reason_str: Option<String> = row.get("rejection_reason")?;
        let execution_str: Option<String> = row.get("last_execution")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_error(0, format!("Invalid plan UUID '{}': {}", id_str, e)))?;

        let status = PlanStatus::from_str(&status_str).map_err(|e| conversion_error(1, e))?;

        let rejection_reason = reason_str
            .map(|s| RejectionReason::from_str(&s))
            .transpose()
            .map_err(|e| conversion_error(3, e))?;

        let last_execution = execution_str
            .map(|s| serde_json::from_str::<ExecutionReport>(&s))
            .transpose()
            .map_err(|e| conversion_error(4, format!("Invalid execution report: {}", e)))?;

        let created_at = parse_timestamp(5, &created_at_str)?;
        let updated_at = parse_timestamp(6, &updated_at_str)?;

        Ok(RenameFilesPlan {
            id,
            status,
            media_folder_path: row.get("media_folder_path")?,
            files: Vec::new(),
            rejection_reason,
            last_execution,
            created_at,
            updated_at,
        })
    }

    fn load_tasks(conn: &rusqlite::Connection, plan_id: Uuid) -> AppResult<Vec<RenameTask>> {
        let mut stmt = conn.prepare(
            "SELECT from_path, to_path FROM rename_plan_tasks
             WHERE plan_id = ?1 ORDER BY position ASC",
        )?;

        let tasks = stmt
            .query_map([plan_id.to_string()], |row| {
                Ok(RenameTask {
                    from: row.get(0)?,
                    to: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }
}

pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("Invalid timestamp '{}': {}", value, e)))
}

impl RenamePlanRepository for SqliteRenamePlanRepository {
    fn insert(&self, plan: &RenameFilesPlan) -> AppResult<()> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn.transaction()?;

        let last_execution = plan
            .last_execution
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            "INSERT INTO rename_plans
                (id, status, media_folder_path, rejection_reason, last_execution, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                plan.id.to_string(),
                plan.status.as_str(),
                plan.media_folder_path,
                plan.rejection_reason.map(|r| r.as_str()),
                last_execution,
                plan.created_at.to_rfc3339(),
                plan.updated_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO rename_plan_tasks (plan_id, position, from_path, to_path)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, task) in plan.files.iter().enumerate() {
                stmt.execute(params![
                    plan.id.to_string(),
                    position as i64,
                    task.from,
                    task.to
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<RenameFilesPlan>> {
        let conn = get_connection(&self.pool)?;

        let plan = conn
            .query_row(
                "SELECT * FROM rename_plans WHERE id = ?1",
                [id.to_string()],
                Self::row_to_plan,
            )
            .optional()?;

        match plan {
            Some(mut plan) => {
                plan.files = Self::load_tasks(&conn, plan.id)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    fn list(&self, status: Option<PlanStatus>) -> AppResult<Vec<RenameFilesPlan>> {
        let conn = get_connection(&self.pool)?;

        let mut plans = match status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM rename_plans WHERE status = ?1 ORDER BY created_at ASC, id ASC",
                )?;
                let rows = stmt.query_map([status.as_str()], Self::row_to_plan)?;
                let plans = rows.collect::<Result<Vec<_>, _>>()?;
                plans
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM rename_plans ORDER BY created_at ASC, id ASC")?;
                let rows = stmt.query_map([], Self::row_to_plan)?;
                let plans = rows.collect::<Result<Vec<_>, _>>()?;
                plans
            }
        };

        for plan in &mut plans {
            plan.files = Self::load_tasks(&conn, plan.id)?;
        }

        Ok(plans)
    }

    fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PlanStatus,
        target: PlanStatus,
        reason: Option<RejectionReason>,
    ) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "UPDATE rename_plans
             SET status = ?1, rejection_reason = ?2, updated_at = ?3
             WHERE id = ?4 AND status = ?5",
            params![
                target.as_str(),
                reason.map(|r| r.as_str()),
                Utc::now().to_rfc3339(),
                id.to_string(),
                expected.as_str(),
            ],
        )?;
        Ok(changed == 1)
    }

    fn record_execution(&self, id: Uuid, report: &ExecutionReport) -> AppResult<bool> {
        let conn = get_connection(&self.pool)?;
        let changed = conn.execute(
            "UPDATE rename_plans SET last_execution = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'pending'",
            params![
                serde_json::to_string(report)?,
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )?;
        Ok(changed == 1)
    }
}
