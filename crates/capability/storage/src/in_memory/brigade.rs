//! 消防队内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::{BrigadeAssignment, BrigadeRecord, BrigadeUpdate};
use crate::traits::BrigadeStore;
use domain::BrigadeStatus;

#[async_trait::async_trait]
impl BrigadeStore for InMemoryStore {
    async fn list_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError> {
        let state = self.read()?;
        let mut brigades: Vec<BrigadeRecord> = state.brigades.values().cloned().collect();
        brigades.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brigades)
    }

    async fn list_available_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError> {
        let state = self.read()?;
        let mut brigades: Vec<BrigadeRecord> = state
            .brigades
            .values()
            .filter(|brigade| brigade.is_available)
            .cloned()
            .collect();
        brigades.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(brigades)
    }

    async fn find_brigade(&self, brigade_id: &str) -> Result<Option<BrigadeRecord>, StorageError> {
        Ok(self.read()?.brigades.get(brigade_id).cloned())
    }

    async fn create_brigade(&self, record: BrigadeRecord) -> Result<BrigadeRecord, StorageError> {
        let mut state = self.write()?;
        if state
            .brigades
            .values()
            .any(|brigade| brigade.name == record.name)
        {
            return Err(StorageError::conflict("brigade name already exists"));
        }
        state
            .brigades
            .insert(record.brigade_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_brigade(
        &self,
        brigade_id: &str,
        update: BrigadeUpdate,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let mut state = self.write()?;
        if let Some(name) = update.name.as_deref() {
            if state
                .brigades
                .values()
                .any(|brigade| brigade.brigade_id != brigade_id && brigade.name == name)
            {
                return Err(StorageError::conflict("brigade name already exists"));
            }
        }
        let Some(brigade) = state.brigades.get_mut(brigade_id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            brigade.name = name;
        }
        if let Some(members) = update.members {
            brigade.members = members;
        }
        Ok(Some(brigade.clone()))
    }

    async fn delete_brigade_if_available(&self, brigade_id: &str) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        match state.brigades.get(brigade_id) {
            Some(brigade) if brigade.is_available => {
                state.brigades.remove(brigade_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn assign_if_available(
        &self,
        brigade_id: &str,
        assignment: BrigadeAssignment,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let mut state = self.write()?;
        match state.brigades.get_mut(brigade_id) {
            Some(brigade) if brigade.is_available => {
                brigade.assignment = assignment;
                brigade.is_available = false;
                Ok(Some(brigade.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_assignment_status(
        &self,
        brigade_id: &str,
        status: BrigadeStatus,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let mut state = self.write()?;
        match state.brigades.get_mut(brigade_id) {
            Some(brigade) if brigade.assignment.building_id.is_some() => {
                brigade.assignment.status = status;
                Ok(Some(brigade.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_brigade(
        &self,
        brigade_id: &str,
    ) -> Result<Option<BrigadeRecord>, StorageError> {
        let mut state = self.write()?;
        match state.brigades.get_mut(brigade_id) {
            Some(brigade) => {
                brigade.assignment = BrigadeAssignment::default();
                brigade.is_available = true;
                Ok(Some(brigade.clone()))
            }
            None => Ok(None),
        }
    }
}
