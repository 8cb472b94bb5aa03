// src/repositories/recognize_plan_repository.rs
//
// Recognition Plan Repository

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::conversion_error;
use super::rename_plan_repository::parse_timestamp;
use crate::db::{get_connection, ConnectionPool};
use crate::domain::{PlanStatus, RecognizeMediaFilePlan, RecognizedFile, RejectionReason};
use crate::error::AppResult;

pub trait RecognizePlanRepository: Send + Sync {
    fn insert(&self, plan: &RecognizeMediaFilePlan) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<RecognizeMediaFilePlan>>;

    fn list(&self, status: Option<PlanStatus>) -> AppResult<Vec<RecognizeMediaFilePlan>>;

    fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PlanStatus,
        target: PlanStatus,
        reason: Option<RejectionReason>,
    ) -> AppResult<bool>;
}

pub struct SqliteRecognizePlanRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteRecognizePlanRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_plan(row: &Row) -> rusqlite::Result<RecognizeMediaFilePlan> {
        let id_str: String = row.get("id")?;
        let status_str: String = row.get("status")?;
        let reason_str: Option<String> = row.get("rejection_reason")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let id = Uuid::parse_str(&id_str)
            .map_err(|e| conversion_error(0, format!("Invalid plan UUID '{}': {}", id_str, e)))?;
        let status = PlanStatus::from_str(&status_str).map_err(|e| conversion_error(1, e))?;
        let rejection_reason = reason_str
            .map(|s| RejectionReason::from_str(&s))
            .transpose()
            .map_err(|e| conversion_error(3, e))?;

        Ok(RecognizeMediaFilePlan {
            id,
            status,
            media_folder_path: row.get("media_folder_path")?,
            files: Vec::new(),
            rejection_reason,
            created_at: parse_timestamp(4, &created_at_str)?,
            updated_at: parse_timestamp(5, &updated_at_str)?,
        })
    }

    fn load_files(conn: &rusqlite::Connection, plan_id: Uuid) -> AppResult<Vec<RecognizedFile>> {
        let mut stmt = conn.prepare(
            "SELECT season, episode, path FROM recognize_plan_files
             WHERE plan_id = ?1 ORDER BY position ASC",
        )?;

        let files = stmt
            .query_map([plan_id.to_string()], |row| {
                Ok(RecognizedFile {
                    season: row.get::<_, i64>(0)? as u32,
                    episode: row.get::<_, i64>(1)? as u32,
                    path: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(files)
    }
}

impl RecognizePlanRepository for SqliteRecognizePlanRepository {
    fn insert(&self, plan: &RecognizeMediaFilePlan) -> AppResult<()> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recognize_plans
                (id, status, media_folder_path, rejection_reason, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                plan.id.to_string(),
                plan.status.as_str(),
                plan.media_folder_path,
                plan.rejection_reason.map(|r| r.as_str()),
                plan.created_at.to_rfc3339(),
                plan.updated_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO recognize_plan_files (plan_id, position, season, episode, path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, file) in plan.files.iter().enumerate() {
                stmt.execute(params![
                    plan.id.to_string(),
                    position as i64,
                    file.season as i64,
                    file.episode as i64,
                    file.path,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<RecognizeMediaFilePlan>> {
        let conn = get_connection(&self.pool)?;

        let plan = conn
            .query_row(
                "SELECT * FROM recognize_plans WHERE id = ?1",
                [id.to_string()],
                Self::row_to_plan,
            )
            .optional()?;

        match plan {
            Some(mut plan) => {
                plan.files = Self::load_files(&conn, plan.id)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    fn list(&self, status: Option<PlanStatus>) -> AppResult<Vec<RecognizeMediaFilePlan>> {
        let conn = get_connection(&self.pool)?;

        let mut stmt = conn.prepare(
            "SELECT * FROM recognize_plans
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([status.map(|s| s.as_str())], Self::row_to_plan)?;
        let mut plans = rows.collect::<Result<Vec<_>, _>>()?;

        for plan in &mut plans {
            plan.files = Self::load_files(&conn, plan.id)?;
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
            "UPDATE recognize_plans
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
}
