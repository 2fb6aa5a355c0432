//! 待审批变更内存存储实现
//!
//! `apply_mutation` 是内存后端唯一的变更应用入口：管理员直接编辑与审批重放
//! 都经由它落库。先检查目标实体全部存在，再写入，保证失败时不留下部分修改。

use super::{FireState, InMemoryStore};
use crate::error::StorageError;
use crate::models::{
    AppliedChange, ApplyOutcome, ApproveOutcome, ChangeReview, FireAlarmRecord,
    PendingChangeRecord,
};
use crate::traits::ChangeStore;
use domain::{AlarmStatus, ChangeMutation, ChangeStatus, ChangeTarget};

fn apply_mutation(
    state: &mut FireState,
    target: &ChangeTarget,
    mutation: &ChangeMutation,
    at_ms: i64,
) -> Result<ApplyOutcome, StorageError> {
    match mutation {
        ChangeMutation::AlarmAdd(draft) => {
            if !state.buildings.contains_key(&target.building_id) {
                return Ok(ApplyOutcome::TargetMissing("building"));
            }
            let Some(floor_id) = target.floor_id.as_deref() else {
                return Ok(ApplyOutcome::TargetMissing("floor"));
            };
            let floor_matches = state
                .floors
                .get(floor_id)
                .is_some_and(|floor| floor.building_id == target.building_id);
            if !floor_matches {
                return Ok(ApplyOutcome::TargetMissing("floor"));
            }
            let record = FireAlarmRecord {
                alarm_id: uuid::Uuid::new_v4().to_string(),
                building_id: target.building_id.clone(),
                floor_id: floor_id.to_string(),
                name: draft.name.clone(),
                kind: draft.kind.clone(),
                status: AlarmStatus::Normal,
                coordinates: draft.coordinates,
                last_updated_ms: at_ms,
            };
            state
                .alarms
                .insert(record.alarm_id.clone(), record.clone());
            Ok(ApplyOutcome::Applied(AppliedChange::AlarmCreated(record)))
        }
        ChangeMutation::AlarmUpdate(patch) => {
            let alarm = target
                .alarm_id
                .as_deref()
                .and_then(|alarm_id| state.alarms.get_mut(alarm_id));
            let Some(alarm) = alarm else {
                return Ok(ApplyOutcome::TargetMissing("alarm"));
            };
            if let Some(name) = &patch.name {
                alarm.name = name.clone();
            }
            if let Some(kind) = &patch.kind {
                alarm.kind = kind.clone();
            }
            if let Some(coordinates) = patch.coordinates {
                alarm.coordinates = coordinates;
            }
            alarm.last_updated_ms = at_ms;
            Ok(ApplyOutcome::Applied(AppliedChange::AlarmUpdated(
                alarm.clone(),
            )))
        }
        ChangeMutation::AlarmDelete => {
            let removed = target
                .alarm_id
                .as_deref()
                .and_then(|alarm_id| state.alarms.remove(alarm_id));
            match removed {
                Some(alarm) => Ok(ApplyOutcome::Applied(AppliedChange::AlarmDeleted(
                    alarm.alarm_id,
                ))),
                None => Ok(ApplyOutcome::TargetMissing("alarm")),
            }
        }
        ChangeMutation::BuildingUpdate(patch) => {
            if !state.buildings.contains_key(&target.building_id) {
                return Ok(ApplyOutcome::TargetMissing("building"));
            }
            if let Some(address) = patch.address.as_deref() {
                let taken = state.buildings.values().any(|building| {
                    building.building_id != target.building_id && building.address == address
                });
                if taken {
                    return Err(StorageError::conflict("building address already exists"));
                }
            }
            let Some(building) = state.buildings.get_mut(&target.building_id) else {
                return Ok(ApplyOutcome::TargetMissing("building"));
            };
            if let Some(name) = &patch.name {
                building.name = name.clone();
            }
            if let Some(address) = &patch.address {
                building.address = address.clone();
            }
            if let Some(floors) = patch.floors {
                building.floors = floors;
            }
            if let Some(status) = patch.status {
                building.status = status;
            }
            if let Some(duty_officers) = &patch.duty_officers {
                building.duty_officers = duty_officers.clone();
            }
            building.updated_at_ms = at_ms;
            Ok(ApplyOutcome::Applied(AppliedChange::BuildingUpdated(
                building.clone(),
            )))
        }
        ChangeMutation::FloorUpdate(patch) => {
            let floor = target
                .floor_id
                .as_deref()
                .and_then(|floor_id| state.floors.get_mut(floor_id))
                .filter(|floor| floor.building_id == target.building_id);
            let Some(floor) = floor else {
                return Ok(ApplyOutcome::TargetMissing("floor"));
            };
            if let Some(path) = &patch.plan_image_path {
                floor.plan_image_path = path.clone();
            }
            if let Some(status) = patch.status {
                floor.status = status;
            }
            floor.updated_at_ms = at_ms;
            Ok(ApplyOutcome::Applied(AppliedChange::FloorUpdated(
                floor.clone(),
            )))
        }
    }
}

#[async_trait::async_trait]
impl ChangeStore for InMemoryStore {
    async fn create_change(
        &self,
        record: PendingChangeRecord,
    ) -> Result<PendingChangeRecord, StorageError> {
        let mut state = self.write()?;
        if state
            .changes
            .iter()
            .any(|change| change.change_id == record.change_id)
        {
            return Err(StorageError::conflict("change id already exists"));
        }
        state.changes.push(record.clone());
        Ok(record)
    }

    async fn find_change(
        &self,
        change_id: &str,
    ) -> Result<Option<PendingChangeRecord>, StorageError> {
        Ok(self
            .read()?
            .changes
            .iter()
            .find(|change| change.change_id == change_id)
            .cloned())
    }

    async fn list_changes(
        &self,
        status: Option<ChangeStatus>,
    ) -> Result<Vec<PendingChangeRecord>, StorageError> {
        let state = self.read()?;
        let mut changes: Vec<PendingChangeRecord> = state
            .changes
            .iter()
            .filter(|change| status.is_none_or(|status| change.status == status))
            .cloned()
            .collect();
        changes.sort_by(|a, b| b.requested_at_ms.cmp(&a.requested_at_ms));
        Ok(changes)
    }

    async fn apply_change(
        &self,
        target: &ChangeTarget,
        mutation: &ChangeMutation,
        at_ms: i64,
    ) -> Result<ApplyOutcome, StorageError> {
        let mut state = self.write()?;
        apply_mutation(&mut state, target, mutation, at_ms)
    }

    async fn approve_change(
        &self,
        change_id: &str,
        review: ChangeReview,
    ) -> Result<ApproveOutcome, StorageError> {
        let mut state = self.write()?;
        let Some(index) = state
            .changes
            .iter()
            .position(|change| change.change_id == change_id)
        else {
            return Ok(ApproveOutcome::NotFound);
        };
        let status = state.changes[index].status;
        if status != ChangeStatus::Pending {
            return Ok(ApproveOutcome::AlreadyReviewed(status));
        }
        let target = state.changes[index].target.clone();
        let mutation = state.changes[index].mutation.clone();
        let applied = match apply_mutation(&mut state, &target, &mutation, review.reviewed_at_ms)? {
            ApplyOutcome::Applied(applied) => applied,
            ApplyOutcome::TargetMissing(entity) => return Ok(ApproveOutcome::TargetMissing(entity)),
        };
        let change = &mut state.changes[index];
        change.status = ChangeStatus::Approved;
        change.reviewed_by = Some(review.reviewer);
        change.reviewed_at_ms = Some(review.reviewed_at_ms);
        Ok(ApproveOutcome::Approved {
            change: change.clone(),
            applied,
        })
    }

    async fn reject_change(
        &self,
        change_id: &str,
        review: ChangeReview,
        reason: Option<String>,
    ) -> Result<Option<PendingChangeRecord>, StorageError> {
        let mut state = self.write()?;
        let change = state
            .changes
            .iter_mut()
            .find(|change| change.change_id == change_id && change.status == ChangeStatus::Pending);
        let Some(change) = change else {
            return Ok(None);
        };
        change.status = ChangeStatus::Rejected;
        change.reviewed_by = Some(review.reviewer);
        change.reviewed_at_ms = Some(review.reviewed_at_ms);
        change.rejection_reason = reason;
        Ok(Some(change.clone()))
    }
}
