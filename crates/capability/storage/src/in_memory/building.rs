//! 建筑内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::BuildingRecord;
use crate::traits::BuildingStore;

#[async_trait::async_trait]
impl BuildingStore for InMemoryStore {
    async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, StorageError> {
        let state = self.read()?;
        let mut buildings: Vec<BuildingRecord> = state.buildings.values().cloned().collect();
        buildings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buildings)
    }

    async fn find_building(
        &self,
        building_id: &str,
    ) -> Result<Option<BuildingRecord>, StorageError> {
        Ok(self.read()?.buildings.get(building_id).cloned())
    }

    async fn search_buildings(&self, query: &str) -> Result<Vec<BuildingRecord>, StorageError> {
        let needle = query.to_lowercase();
        let state = self.read()?;
        let mut buildings: Vec<BuildingRecord> = state
            .buildings
            .values()
            .filter(|building| {
                building.name.to_lowercase().contains(&needle)
                    || building.address.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        buildings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buildings)
    }

    async fn create_building(
        &self,
        record: BuildingRecord,
    ) -> Result<BuildingRecord, StorageError> {
        let mut state = self.write()?;
        if state
            .buildings
            .values()
            .any(|building| building.address == record.address)
        {
            return Err(StorageError::conflict("building address already exists"));
        }
        state
            .buildings
            .insert(record.building_id.clone(), record.clone());
        Ok(record)
    }

    /// 删除建筑（级联删除楼层与告警器，持锁期间一次完成）
    async fn delete_building(&self, building_id: &str) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        if state.buildings.remove(building_id).is_none() {
            return Ok(false);
        }
        state
            .alarms
            .retain(|_, alarm| alarm.building_id != building_id);
        state
            .floors
            .retain(|_, floor| floor.building_id != building_id);
        Ok(true)
    }
}
