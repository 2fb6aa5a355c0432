//! Postgres 告警历史存储实现

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::{AlarmHistoryFilter, AlarmHistoryRecord, ResolveOutcome};
use crate::traits::AlarmHistoryStore;
use domain::AlarmStatus;
use sqlx::Row;
use sqlx::postgres::PgRow;

const HISTORY_COLUMNS: &str = "history_id, building_id, floor_id, alarm_id, status, \
     (extract(epoch from recorded_at) * 1000)::bigint as timestamp_ms, \
     (extract(epoch from resolved_at) * 1000)::bigint as resolved_at_ms, resolved_by";

fn history_from_row(row: &PgRow) -> Result<AlarmHistoryRecord, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(AlarmHistoryRecord {
        history_id: row.try_get("history_id")?,
        building_id: row.try_get("building_id")?,
        floor_id: row.try_get("floor_id")?,
        alarm_id: row.try_get("alarm_id")?,
        status: parse_enum(&status)?,
        timestamp_ms: row.try_get("timestamp_ms")?,
        resolved_at_ms: row.try_get("resolved_at_ms")?,
        resolved_by: row.try_get("resolved_by")?,
    })
}

#[async_trait::async_trait]
impl AlarmHistoryStore for PgStore {
    async fn list_history(
        &self,
        filter: AlarmHistoryFilter,
    ) -> Result<Vec<AlarmHistoryRecord>, StorageError> {
        let limit = filter.limit.map(|limit| limit as i64);
        let rows = sqlx::query(&format!(
            "select {HISTORY_COLUMNS} from alarm_history \
             where ($1::text is null or building_id = $1) \
               and ($2::float8 is null or recorded_at >= to_timestamp($2 / 1000.0)) \
               and ($3::float8 is null or recorded_at <= to_timestamp($3 / 1000.0)) \
               and ($4::text is null or status = $4) \
             order by recorded_at desc \
             limit $5"
        ))
        .bind(filter.building_id)
        .bind(filter.start_ms.map(ms_param))
        .bind(filter.end_ms.map(ms_param))
        .bind(filter.status.map(|status| status.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(history_from_row).collect()
    }

    async fn find_history(
        &self,
        history_id: &str,
    ) -> Result<Option<AlarmHistoryRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {HISTORY_COLUMNS} from alarm_history where history_id = $1"
        ))
        .bind(history_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(history_from_row).transpose()
    }

    async fn resolve_history(
        &self,
        history_id: &str,
        resolved_by: &str,
        at_ms: i64,
    ) -> Result<ResolveOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "update alarm_history set resolved_at = to_timestamp($2 / 1000.0), resolved_by = $3 \
             where history_id = $1 and resolved_at is null \
             returning {HISTORY_COLUMNS}"
        ))
        .bind(history_id)
        .bind(ms_param(at_ms))
        .bind(resolved_by)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            let exists: Option<String> =
                sqlx::query_scalar("select history_id from alarm_history where history_id = $1")
                    .bind(history_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Ok(match exists {
                Some(_) => ResolveOutcome::AlreadyResolved,
                None => ResolveOutcome::NotFound,
            });
        };
        let record = history_from_row(&row)?;

        let mut alarm_reset = false;
        if record.status == AlarmStatus::Alarm {
            let result = sqlx::query(
                "update fire_alarms set status = $2, last_updated = to_timestamp($3 / 1000.0) \
                 where alarm_id = $1 and status = $4",
            )
            .bind(&record.alarm_id)
            .bind(AlarmStatus::Normal.as_str())
            .bind(ms_param(at_ms))
            .bind(AlarmStatus::Alarm.as_str())
            .execute(&mut *tx)
            .await?;
            alarm_reset = result.rows_affected() > 0;
        }
        tx.commit().await?;
        Ok(ResolveOutcome::Resolved {
            record,
            alarm_reset,
        })
    }
}
