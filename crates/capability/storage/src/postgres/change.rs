//! Postgres 待审批变更存储实现
//!
//! `apply_in_tx` 在调用方的事务内按变体落库；直接编辑与审批重放共用。

use super::alarm::{ALARM_COLUMNS, alarm_from_row};
use super::building::{BUILDING_COLUMNS, building_from_row};
use super::floor::{FLOOR_COLUMNS, floor_from_row};
use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::{
    AppliedChange, ApplyOutcome, ApproveOutcome, ChangeReview, PendingChangeRecord,
};
use crate::traits::ChangeStore;
use domain::{AlarmStatus, ChangeMutation, ChangeStatus, ChangeTarget, ChangeType};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

const CHANGE_COLUMNS: &str = "change_id, change_type, building_id, floor_id, alarm_id, \
     changes::text as changes, requested_by, \
     (extract(epoch from requested_at) * 1000)::bigint as requested_at_ms, \
     status, reviewed_by, \
     (extract(epoch from reviewed_at) * 1000)::bigint as reviewed_at_ms, rejection_reason";

fn change_from_row(row: &PgRow) -> Result<PendingChangeRecord, StorageError> {
    let change_type: String = row.try_get("change_type")?;
    let change_type: ChangeType = parse_enum(&change_type)?;
    let changes: String = row.try_get("changes")?;
    let changes: serde_json::Value =
        serde_json::from_str(&changes).map_err(|err| StorageError::new(err.to_string()))?;
    let status: String = row.try_get("status")?;
    Ok(PendingChangeRecord {
        change_id: row.try_get("change_id")?,
        target: ChangeTarget {
            building_id: row.try_get("building_id")?,
            floor_id: row.try_get("floor_id")?,
            alarm_id: row.try_get("alarm_id")?,
        },
        mutation: ChangeMutation::from_changes(change_type, &changes)?,
        requested_by: row.try_get("requested_by")?,
        requested_at_ms: row.try_get("requested_at_ms")?,
        status: parse_enum(&status)?,
        reviewed_by: row.try_get("reviewed_by")?,
        reviewed_at_ms: row.try_get("reviewed_at_ms")?,
        rejection_reason: row.try_get("rejection_reason")?,
    })
}

async fn apply_in_tx(
    conn: &mut PgConnection,
    target: &ChangeTarget,
    mutation: &ChangeMutation,
    at_ms: i64,
) -> Result<ApplyOutcome, StorageError> {
    match mutation {
        ChangeMutation::AlarmAdd(draft) => {
            let building: Option<String> =
                sqlx::query_scalar("select building_id from buildings where building_id = $1")
                    .bind(&target.building_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            if building.is_none() {
                return Ok(ApplyOutcome::TargetMissing("building"));
            }
            let Some(floor_id) = target.floor_id.as_deref() else {
                return Ok(ApplyOutcome::TargetMissing("floor"));
            };
            let floor: Option<String> = sqlx::query_scalar(
                "select floor_id from floors where floor_id = $1 and building_id = $2",
            )
            .bind(floor_id)
            .bind(&target.building_id)
            .fetch_optional(&mut *conn)
            .await?;
            if floor.is_none() {
                return Ok(ApplyOutcome::TargetMissing("floor"));
            }
            let row = sqlx::query(&format!(
                "insert into fire_alarms \
                 (alarm_id, building_id, floor_id, name, kind, status, coord_x, coord_y, \
                  last_updated) \
                 values ($1, $2, $3, $4, $5, $6, $7, $8, to_timestamp($9 / 1000.0)) \
                 returning {ALARM_COLUMNS}"
            ))
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&target.building_id)
            .bind(floor_id)
            .bind(&draft.name)
            .bind(&draft.kind)
            .bind(AlarmStatus::Normal.as_str())
            .bind(draft.coordinates.x)
            .bind(draft.coordinates.y)
            .bind(ms_param(at_ms))
            .fetch_one(&mut *conn)
            .await?;
            Ok(ApplyOutcome::Applied(AppliedChange::AlarmCreated(
                alarm_from_row(&row)?,
            )))
        }
        ChangeMutation::AlarmUpdate(patch) => {
            let row = sqlx::query(&format!(
                "update fire_alarms set \
                 name = coalesce($2, name), \
                 kind = coalesce($3, kind), \
                 coord_x = coalesce($4, coord_x), \
                 coord_y = coalesce($5, coord_y), \
                 last_updated = to_timestamp($6 / 1000.0) \
                 where alarm_id = $1 \
                 returning {ALARM_COLUMNS}"
            ))
            .bind(target.alarm_id.as_deref())
            .bind(patch.name.as_deref())
            .bind(patch.kind.as_deref())
            .bind(patch.coordinates.map(|coordinates| coordinates.x))
            .bind(patch.coordinates.map(|coordinates| coordinates.y))
            .bind(ms_param(at_ms))
            .fetch_optional(&mut *conn)
            .await?;
            match row {
                Some(row) => Ok(ApplyOutcome::Applied(AppliedChange::AlarmUpdated(
                    alarm_from_row(&row)?,
                ))),
                None => Ok(ApplyOutcome::TargetMissing("alarm")),
            }
        }
        ChangeMutation::AlarmDelete => {
            let deleted: Option<String> = sqlx::query_scalar(
                "delete from fire_alarms where alarm_id = $1 returning alarm_id",
            )
            .bind(target.alarm_id.as_deref())
            .fetch_optional(&mut *conn)
            .await?;
            match deleted {
                Some(alarm_id) => Ok(ApplyOutcome::Applied(AppliedChange::AlarmDeleted(alarm_id))),
                None => Ok(ApplyOutcome::TargetMissing("alarm")),
            }
        }
        ChangeMutation::BuildingUpdate(patch) => {
            let row = sqlx::query(&format!(
                "update buildings set \
                 name = coalesce($2, name), \
                 address = coalesce($3, address), \
                 floors = coalesce($4, floors), \
                 status = coalesce($5, status), \
                 duty_officers = coalesce($6, duty_officers), \
                 updated_at = to_timestamp($7 / 1000.0) \
                 where building_id = $1 \
                 returning {BUILDING_COLUMNS}"
            ))
            .bind(&target.building_id)
            .bind(patch.name.as_deref())
            .bind(patch.address.as_deref())
            .bind(patch.floors)
            .bind(patch.status.map(|status| status.as_str()))
            .bind(patch.duty_officers.clone())
            .bind(ms_param(at_ms))
            .fetch_optional(&mut *conn)
            .await?;
            match row {
                Some(row) => Ok(ApplyOutcome::Applied(AppliedChange::BuildingUpdated(
                    building_from_row(&row)?,
                ))),
                None => Ok(ApplyOutcome::TargetMissing("building")),
            }
        }
        ChangeMutation::FloorUpdate(patch) => {
            let row = sqlx::query(&format!(
                "update floors set \
                 plan_image_path = coalesce($3, plan_image_path), \
                 status = coalesce($4, status), \
                 updated_at = to_timestamp($5 / 1000.0) \
                 where floor_id = $1 and building_id = $2 \
                 returning {FLOOR_COLUMNS}"
            ))
            .bind(target.floor_id.as_deref())
            .bind(&target.building_id)
            .bind(patch.plan_image_path.as_deref())
            .bind(patch.status.map(|status| status.as_str()))
            .bind(ms_param(at_ms))
            .fetch_optional(&mut *conn)
            .await?;
            match row {
                Some(row) => Ok(ApplyOutcome::Applied(AppliedChange::FloorUpdated(
                    floor_from_row(&row)?,
                ))),
                None => Ok(ApplyOutcome::TargetMissing("floor")),
            }
        }
    }
}

#[async_trait::async_trait]
impl ChangeStore for PgStore {
    async fn create_change(
        &self,
        record: PendingChangeRecord,
    ) -> Result<PendingChangeRecord, StorageError> {
        let changes = record.mutation.to_changes()?.to_string();
        sqlx::query(
            "insert into pending_changes \
             (change_id, change_type, building_id, floor_id, alarm_id, changes, requested_by, \
              requested_at, status) \
             values ($1, $2, $3, $4, $5, $6::jsonb, $7, to_timestamp($8 / 1000.0), $9)",
        )
        .bind(&record.change_id)
        .bind(record.change_type().as_str())
        .bind(&record.target.building_id)
        .bind(&record.target.floor_id)
        .bind(&record.target.alarm_id)
        .bind(changes)
        .bind(&record.requested_by)
        .bind(ms_param(record.requested_at_ms))
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_change(
        &self,
        change_id: &str,
    ) -> Result<Option<PendingChangeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {CHANGE_COLUMNS} from pending_changes where change_id = $1"
        ))
        .bind(change_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(change_from_row).transpose()
    }

    async fn list_changes(
        &self,
        status: Option<ChangeStatus>,
    ) -> Result<Vec<PendingChangeRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {CHANGE_COLUMNS} from pending_changes \
             where ($1::text is null or status = $1) \
             order by requested_at desc"
        ))
        .bind(status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(change_from_row).collect()
    }

    async fn apply_change(
        &self,
        target: &ChangeTarget,
        mutation: &ChangeMutation,
        at_ms: i64,
    ) -> Result<ApplyOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        let outcome = apply_in_tx(&mut tx, target, mutation, at_ms).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn approve_change(
        &self,
        change_id: &str,
        review: ChangeReview,
    ) -> Result<ApproveOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "select {CHANGE_COLUMNS} from pending_changes where change_id = $1 for update"
        ))
        .bind(change_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(ApproveOutcome::NotFound);
        };
        let change = change_from_row(&row)?;
        if change.status != ChangeStatus::Pending {
            tx.rollback().await?;
            return Ok(ApproveOutcome::AlreadyReviewed(change.status));
        }

        let applied = match apply_in_tx(
            &mut tx,
            &change.target,
            &change.mutation,
            review.reviewed_at_ms,
        )
        .await?
        {
            ApplyOutcome::Applied(applied) => applied,
            ApplyOutcome::TargetMissing(entity) => {
                tx.rollback().await?;
                return Ok(ApproveOutcome::TargetMissing(entity));
            }
        };

        let row = sqlx::query(&format!(
            "update pending_changes set status = $2, reviewed_by = $3, \
             reviewed_at = to_timestamp($4 / 1000.0) \
             where change_id = $1 \
             returning {CHANGE_COLUMNS}"
        ))
        .bind(change_id)
        .bind(ChangeStatus::Approved.as_str())
        .bind(&review.reviewer)
        .bind(ms_param(review.reviewed_at_ms))
        .fetch_one(&mut *tx)
        .await?;
        let change = change_from_row(&row)?;
        tx.commit().await?;
        Ok(ApproveOutcome::Approved { change, applied })
    }

    async fn reject_change(
        &self,
        change_id: &str,
        review: ChangeReview,
        reason: Option<String>,
    ) -> Result<Option<PendingChangeRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update pending_changes set status = $2, reviewed_by = $3, \
             reviewed_at = to_timestamp($4 / 1000.0), rejection_reason = $5 \
             where change_id = $1 and status = $6 \
             returning {CHANGE_COLUMNS}"
        ))
        .bind(change_id)
        .bind(ChangeStatus::Rejected.as_str())
        .bind(&review.reviewer)
        .bind(ms_param(review.reviewed_at_ms))
        .bind(reason)
        .bind(ChangeStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(change_from_row).transpose()
    }
}
