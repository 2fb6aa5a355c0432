//! Postgres 楼层存储实现

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::FloorRecord;
use crate::traits::FloorStore;
use sqlx::Row;
use sqlx::postgres::PgRow;

pub(crate) const FLOOR_COLUMNS: &str = "floor_id, building_id, floor_number, plan_image_path, \
     status, (extract(epoch from updated_at) * 1000)::bigint as updated_at_ms";

pub(crate) fn floor_from_row(row: &PgRow) -> Result<FloorRecord, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(FloorRecord {
        floor_id: row.try_get("floor_id")?,
        building_id: row.try_get("building_id")?,
        floor_number: row.try_get("floor_number")?,
        plan_image_path: row.try_get("plan_image_path")?,
        status: parse_enum(&status)?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl FloorStore for PgStore {
    async fn list_floors(&self, building_id: &str) -> Result<Vec<FloorRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {FLOOR_COLUMNS} from floors where building_id = $1 \
             order by floor_number asc"
        ))
        .bind(building_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(floor_from_row).collect()
    }

    async fn find_floor(&self, floor_id: &str) -> Result<Option<FloorRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {FLOOR_COLUMNS} from floors where floor_id = $1"
        ))
        .bind(floor_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(floor_from_row).transpose()
    }

    async fn create_floor(&self, record: FloorRecord) -> Result<FloorRecord, StorageError> {
        sqlx::query(
            "insert into floors \
             (floor_id, building_id, floor_number, plan_image_path, status, updated_at) \
             values ($1, $2, $3, $4, $5, to_timestamp($6 / 1000.0))",
        )
        .bind(&record.floor_id)
        .bind(&record.building_id)
        .bind(record.floor_number)
        .bind(&record.plan_image_path)
        .bind(record.status.as_str())
        .bind(ms_param(record.updated_at_ms))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete_floor(&self, floor_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from floors where floor_id = $1")
            .bind(floor_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
