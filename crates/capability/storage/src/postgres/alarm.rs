//! Postgres 告警器存储实现

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::{AlarmTransition, FireAlarmRecord};
use crate::traits::AlarmStore;
use domain::{AlarmStatus, BuildingStatus, Coordinates};
use sqlx::Row;
use sqlx::postgres::PgRow;

pub(crate) const ALARM_COLUMNS: &str = "alarm_id, building_id, floor_id, name, kind, status, \
     coord_x, coord_y, (extract(epoch from last_updated) * 1000)::bigint as last_updated_ms";

pub(crate) fn alarm_from_row(row: &PgRow) -> Result<FireAlarmRecord, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(FireAlarmRecord {
        alarm_id: row.try_get("alarm_id")?,
        building_id: row.try_get("building_id")?,
        floor_id: row.try_get("floor_id")?,
        name: row.try_get("name")?,
        kind: row.try_get("kind")?,
        status: parse_enum(&status)?,
        coordinates: Coordinates {
            x: row.try_get("coord_x")?,
            y: row.try_get("coord_y")?,
        },
        last_updated_ms: row.try_get("last_updated_ms")?,
    })
}

impl PgStore {
    async fn alarms_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {ALARM_COLUMNS} from fire_alarms where {condition} = $1 order by name asc"
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(alarm_from_row).collect()
    }
}

#[async_trait::async_trait]
impl AlarmStore for PgStore {
    async fn list_alarms_by_building(
        &self,
        building_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.alarms_where("building_id", building_id).await
    }

    async fn list_alarms_by_floor(
        &self,
        floor_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.alarms_where("floor_id", floor_id).await
    }

    async fn list_alarms_by_status(
        &self,
        status: AlarmStatus,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.alarms_where("status", status.as_str()).await
    }

    async fn find_alarm(&self, alarm_id: &str) -> Result<Option<FireAlarmRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {ALARM_COLUMNS} from fire_alarms where alarm_id = $1"
        ))
        .bind(alarm_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(alarm_from_row).transpose()
    }

    async fn transition_alarm_status(
        &self,
        transition: AlarmTransition,
    ) -> Result<Option<FireAlarmRecord>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "update fire_alarms set status = $3, last_updated = to_timestamp($4 / 1000.0) \
             where alarm_id = $1 and status = $2 \
             returning {ALARM_COLUMNS}"
        ))
        .bind(&transition.alarm_id)
        .bind(transition.expected.as_str())
        .bind(transition.next.as_str())
        .bind(ms_param(transition.at_ms))
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let alarm = alarm_from_row(&row)?;

        if let Some(history) = &transition.history {
            sqlx::query(
                "insert into alarm_history \
                 (history_id, building_id, floor_id, alarm_id, status, recorded_at) \
                 values ($1, $2, $3, $4, $5, to_timestamp($6 / 1000.0))",
            )
            .bind(&history.history_id)
            .bind(&history.building_id)
            .bind(&history.floor_id)
            .bind(&history.alarm_id)
            .bind(history.status.as_str())
            .bind(ms_param(history.timestamp_ms))
            .execute(&mut *tx)
            .await?;
        }
        if transition.escalate {
            sqlx::query(
                "update floors set status = $2, updated_at = to_timestamp($3 / 1000.0) \
                 where floor_id = $1",
            )
            .bind(&alarm.floor_id)
            .bind(BuildingStatus::Fire.as_str())
            .bind(ms_param(transition.at_ms))
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "update buildings set status = $2, updated_at = to_timestamp($3 / 1000.0) \
                 where building_id = $1",
            )
            .bind(&alarm.building_id)
            .bind(BuildingStatus::Fire.as_str())
            .bind(ms_param(transition.at_ms))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(Some(alarm))
    }
}
