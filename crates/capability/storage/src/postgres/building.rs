//! Postgres 建筑存储实现

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::BuildingRecord;
use crate::traits::BuildingStore;
use sqlx::Row;
use sqlx::postgres::PgRow;

pub(crate) const BUILDING_COLUMNS: &str = "building_id, name, address, floors, status, \
     created_by, duty_officers, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms, \
     (extract(epoch from updated_at) * 1000)::bigint as updated_at_ms";

pub(crate) fn building_from_row(row: &PgRow) -> Result<BuildingRecord, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(BuildingRecord {
        building_id: row.try_get("building_id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        floors: row.try_get("floors")?,
        status: parse_enum(&status)?,
        created_by: row.try_get("created_by")?,
        duty_officers: row.try_get("duty_officers")?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl BuildingStore for PgStore {
    async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {BUILDING_COLUMNS} from buildings order by name asc"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(building_from_row).collect()
    }

    async fn find_building(
        &self,
        building_id: &str,
    ) -> Result<Option<BuildingRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {BUILDING_COLUMNS} from buildings where building_id = $1"
        ))
        .bind(building_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(building_from_row).transpose()
    }

    async fn search_buildings(&self, query: &str) -> Result<Vec<BuildingRecord>, StorageError> {
        let pattern = format!(
            "%{}%",
            query
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );
        let rows = sqlx::query(&format!(
            "select {BUILDING_COLUMNS} from buildings \
             where name ilike $1 or address ilike $1 \
             order by name asc"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(building_from_row).collect()
    }

    async fn create_building(
        &self,
        record: BuildingRecord,
    ) -> Result<BuildingRecord, StorageError> {
        sqlx::query(
            "insert into buildings \
             (building_id, name, address, floors, status, created_by, duty_officers, \
              created_at, updated_at) \
             values ($1, $2, $3, $4, $5, $6, $7, to_timestamp($8 / 1000.0), \
              to_timestamp($9 / 1000.0))",
        )
        .bind(&record.building_id)
        .bind(&record.name)
        .bind(&record.address)
        .bind(record.floors)
        .bind(record.status.as_str())
        .bind(&record.created_by)
        .bind(&record.duty_officers)
        .bind(ms_param(record.created_at_ms))
        .bind(ms_param(record.updated_at_ms))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    /// 楼层与告警器由外键 `on delete cascade` 一并删除
    async fn delete_building(&self, building_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from buildings where building_id = $1")
            .bind(building_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
