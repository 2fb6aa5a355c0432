//! 告警器内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::{AlarmTransition, FireAlarmRecord};
use crate::traits::AlarmStore;
use domain::{AlarmStatus, BuildingStatus};

impl InMemoryStore {
    fn collect_alarms(
        &self,
        predicate: impl Fn(&FireAlarmRecord) -> bool,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        let state = self.read()?;
        let mut alarms: Vec<FireAlarmRecord> = state
            .alarms
            .values()
            .filter(|alarm| predicate(alarm))
            .cloned()
            .collect();
        alarms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(alarms)
    }
}

#[async_trait::async_trait]
impl AlarmStore for InMemoryStore {
    async fn list_alarms_by_building(
        &self,
        building_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.collect_alarms(|alarm| alarm.building_id == building_id)
    }

    async fn list_alarms_by_floor(
        &self,
        floor_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.collect_alarms(|alarm| alarm.floor_id == floor_id)
    }

    async fn list_alarms_by_status(
        &self,
        status: AlarmStatus,
    ) -> Result<Vec<FireAlarmRecord>, StorageError> {
        self.collect_alarms(|alarm| alarm.status == status)
    }

    async fn find_alarm(&self, alarm_id: &str) -> Result<Option<FireAlarmRecord>, StorageError> {
        Ok(self.read()?.alarms.get(alarm_id).cloned())
    }

    async fn transition_alarm_status(
        &self,
        transition: AlarmTransition,
    ) -> Result<Option<FireAlarmRecord>, StorageError> {
        let mut state = self.write()?;
        let Some(alarm) = state.alarms.get_mut(&transition.alarm_id) else {
            return Ok(None);
        };
        if alarm.status != transition.expected {
            return Ok(None);
        }
        alarm.status = transition.next;
        alarm.last_updated_ms = transition.at_ms;
        let updated = alarm.clone();

        if let Some(history) = transition.history {
            state.history.push(history);
        }
        if transition.escalate {
            if let Some(floor) = state.floors.get_mut(&updated.floor_id) {
                floor.status = BuildingStatus::Fire;
                floor.updated_at_ms = transition.at_ms;
            }
            if let Some(building) = state.buildings.get_mut(&updated.building_id) {
                building.status = BuildingStatus::Fire;
                building.updated_at_ms = transition.at_ms;
            }
        }
        Ok(Some(updated))
    }
}
