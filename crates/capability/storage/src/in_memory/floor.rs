//! 楼层内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::FloorRecord;
use crate::traits::FloorStore;

#[async_trait::async_trait]
impl FloorStore for InMemoryStore {
    async fn list_floors(&self, building_id: &str) -> Result<Vec<FloorRecord>, StorageError> {
        let state = self.read()?;
        let mut floors: Vec<FloorRecord> = state
            .floors
            .values()
            .filter(|floor| floor.building_id == building_id)
            .cloned()
            .collect();
        floors.sort_by_key(|floor| floor.floor_number);
        Ok(floors)
    }

    async fn find_floor(&self, floor_id: &str) -> Result<Option<FloorRecord>, StorageError> {
        Ok(self.read()?.floors.get(floor_id).cloned())
    }

    async fn create_floor(&self, record: FloorRecord) -> Result<FloorRecord, StorageError> {
        let mut state = self.write()?;
        if state.floors.values().any(|floor| {
            floor.building_id == record.building_id && floor.floor_number == record.floor_number
        }) {
            return Err(StorageError::conflict("floor number already exists in building"));
        }
        state.floors.insert(record.floor_id.clone(), record.clone());
        Ok(record)
    }

    async fn delete_floor(&self, floor_id: &str) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        if state.floors.remove(floor_id).is_none() {
            return Ok(false);
        }
        state.alarms.retain(|_, alarm| alarm.floor_id != floor_id);
        Ok(true)
    }
}
