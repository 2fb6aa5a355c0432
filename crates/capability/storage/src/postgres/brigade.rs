//! Postgres 消防队存储实现
//!
//! 当前任务展开为 `assignment_*` 列；`is_available` 与 `assignment_building_id`
//! 始终在同一条 update 中写入。

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::{BrigadeAssignment, BrigadeRecord, BrigadeUpdate};
use crate::traits::BrigadeStore;
use domain::BrigadeStatus;
use sqlx::Row;
use sqlx::postgres::PgRow;

const BRIGADE_COLUMNS: &str = "brigade_id, name, members, is_available, \
     assignment_building_id, assignment_assigned_by, assignment_status, \
     (extract(epoch from assignment_assigned_at) * 1000)::bigint as assignment_assigned_at_ms";

fn brigade_from_row(row: &PgRow) -> Result<BrigadeRecord, StorageError> {
    let status: String = row.try_get("assignment_status")?;
    Ok(BrigadeRecord {
        brigade_id: row.try_get("brigade_id")?,
        name: row.try_get("name")?,
        members: row.try_get("members")?,
        is_available: row.try_get("is_available")?,
        assignment: BrigadeAssignment {
            building_id: row.try_get("assignment_building_id")?,
            assigned_at_ms: row.try_get("assignment_assigned_at_ms")?,
            assigned_by: row.try_get("assignment_assigned_by")?,
            status: parse_enum(&status)?,
        },
    })
}

#[async_trait::async_trait]
impl BrigadeStore for PgStore {
    async fn list_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {BRIGADE_COLUMNS} from fire_brigades order by name asc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(brigade_from_row).collect()
    }

    async fn list_available_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {BRIGADE_COLUMNS} from fire_brigades where is_available order by name asc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(brigade_from_row).collect()
    }

    async fn find_brigade(&self, brigade_id: &str) -> Result<Option<BrigadeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {BRIGADE_COLUMNS} from fire_brigades where brigade_id = $1"
        ))
        .bind(brigade_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(brigade_from_row).transpose()
    }

    async fn create_brigade(&self, record: BrigadeRecord) -> Result<BrigadeRecord, StorageError> {
        sqlx::query(
            "insert into fire_brigades \
             (brigade_id, name, members, is_available, assignment_status) \
             values ($1, $2, $3, $4, $5)",
        )
        .bind(&record.brigade_id)
        .bind(&record.name)
        .bind(&record.members)
        .bind(record.is_available)
        .bind(record.assignment.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_brigade(
        &self,
        brigade_id: &str,
        update: BrigadeUpdate,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update fire_brigades set \
             name = coalesce($2, name), \
             members = coalesce($3, members) \
             where brigade_id = $1 \
             returning {BRIGADE_COLUMNS}"
        ))
        .bind(brigade_id)
        .bind(update.name)
        .bind(update.members)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(brigade_from_row).transpose()
    }

    async fn delete_brigade_if_available(&self, brigade_id: &str) -> Result<bool, StorageError> {
        let result =
            sqlx::query("delete from fire_brigades where brigade_id = $1 and is_available")
                .bind(brigade_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_if_available(
        &self,
        brigade_id: &str,
        assignment: BrigadeAssignment,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update fire_brigades set \
             is_available = false, \
             assignment_building_id = $2, \
             assignment_assigned_at = to_timestamp($3 / 1000.0), \
             assignment_assigned_by = $4, \
             assignment_status = $5 \
             where brigade_id = $1 and is_available \
             returning {BRIGADE_COLUMNS}"
        ))
        .bind(brigade_id)
        .bind(assignment.building_id)
        .bind(assignment.assigned_at_ms.map(ms_param))
        .bind(assignment.assigned_by)
        .bind(assignment.status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(brigade_from_row).transpose()
    }

    async fn set_assignment_status(
        &self,
        brigade_id: &str,
        status: BrigadeStatus,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update fire_brigades set assignment_status = $2 \
             where brigade_id = $1 and assignment_building_id is not null \
             returning {BRIGADE_COLUMNS}"
        ))
        .bind(brigade_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(brigade_from_row).transpose()
    }

    async fn release_brigade(
        &self,
        brigade_id: &str,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update fire_brigades set \
             is_available = true, \
             assignment_building_id = null, \
             assignment_assigned_at = null, \
             assignment_assigned_by = null, \
             assignment_status = $2 \
             where brigade_id = $1 \
             returning {BRIGADE_COLUMNS}"
        ))
        .bind(brigade_id)
        .bind(BrigadeStatus::Available.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(brigade_from_row).transpose()
    }
}
