//! 消防队管理、派遣与任务状态
//!
//! 派遣与释放都由存储层条件更新完成，`is_available` 与当前任务同步变化。

use crate::{Stores, WorkflowError, authorize, new_id, now_ms, require_text};
use domain::permissions::{BRIGADE_AVAILABLE_READ, BRIGADE_DISPATCH, BRIGADE_MANAGE, BRIGADE_READ};
use domain::{BrigadeStatus, BuildingStatus, ParseEnumError, Principal, Role};
use fire_notify::{EventKind, Publisher, routes};
use fire_storage::{BrigadeAssignment, BrigadeRecord, BrigadeUpdate};
use fire_telemetry::record_brigade_assigned;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 新建消防队。
#[derive(Debug, Clone, Default)]
pub struct BrigadeDraft {
    pub name: String,
    pub members: Vec<String>,
}

pub struct BrigadeService {
    stores: Stores,
    publisher: Arc<dyn Publisher>,
}

impl BrigadeService {
    pub fn new(stores: Stores, publisher: Arc<dyn Publisher>) -> Self {
        Self { stores, publisher }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<BrigadeRecord>, WorkflowError> {
        authorize(principal, BRIGADE_READ)?;
        Ok(self.stores.brigades.list_brigades().await?)
    }

    pub async fn available(
        &self,
        principal: &Principal,
    ) -> Result<Vec<BrigadeRecord>, WorkflowError> {
        authorize(principal, BRIGADE_AVAILABLE_READ)?;
        Ok(self.stores.brigades.list_available_brigades().await?)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        brigade_id: &str,
    ) -> Result<BrigadeRecord, WorkflowError> {
        authorize(principal, BRIGADE_READ)?;
        self.find(brigade_id).await
    }

    pub async fn create(
        &self,
        principal: &Principal,
        draft: BrigadeDraft,
    ) -> Result<BrigadeRecord, WorkflowError> {
        authorize(principal, BRIGADE_MANAGE)?;
        require_text(&draft.name, "name")?;
        self.check_members(&draft.members).await?;
        let record = BrigadeRecord {
            brigade_id: new_id(),
            name: draft.name.trim().to_string(),
            members: draft.members,
            is_available: true,
            assignment: BrigadeAssignment::default(),
        };
        let record = self.stores.brigades.create_brigade(record).await?;
        info!(
            target: "fire.workflow",
            brigade_id = %record.brigade_id,
            name = %record.name,
            members = record.members.len(),
            "brigade_created"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        brigade_id: &str,
        update: BrigadeUpdate,
    ) -> Result<BrigadeRecord, WorkflowError> {
        authorize(principal, BRIGADE_MANAGE)?;
        if let Some(name) = &update.name {
            require_text(name, "name")?;
        }
        if let Some(members) = &update.members {
            self.check_members(members).await?;
        }
        let update = BrigadeUpdate {
            name: update.name.map(|name| name.trim().to_string()),
            members: update.members,
        };
        self.stores
            .brigades
            .update_brigade(brigade_id, update)
            .await?
            .ok_or(WorkflowError::NotFound("brigade"))
    }

    /// 删除消防队；执行任务中的队伍不能删除。
    pub async fn delete(&self, principal: &Principal, brigade_id: &str) -> Result<(), WorkflowError> {
        authorize(principal, BRIGADE_MANAGE)?;
        if self.stores.brigades.delete_brigade_if_available(brigade_id).await? {
            info!(target: "fire.workflow", brigade_id = %brigade_id, "brigade_deleted");
            return Ok(());
        }
        match self.stores.brigades.find_brigade(brigade_id).await? {
            Some(_) => Err(WorkflowError::PreconditionFailed(
                "brigade is currently assigned".to_string(),
            )),
            None => Err(WorkflowError::NotFound("brigade")),
        }
    }

    /// 用户仍是某支消防队成员时返回前置条件失败；改角色或删除用户前调用。
    pub async fn ensure_not_member(&self, user_id: &str) -> Result<(), WorkflowError> {
        let brigades = self.stores.brigades.list_brigades().await?;
        match brigades
            .iter()
            .find(|brigade| brigade.members.iter().any(|member| member == user_id))
        {
            Some(brigade) => Err(WorkflowError::PreconditionFailed(format!(
                "user is a member of brigade {}",
                brigade.name
            ))),
            None => Ok(()),
        }
    }

    /// 派遣空闲消防队前往起火建筑。
    pub async fn assign(
        &self,
        principal: &Principal,
        brigade_id: &str,
        building_id: &str,
    ) -> Result<BrigadeRecord, WorkflowError> {
        authorize(principal, BRIGADE_DISPATCH)?;
        let brigade = self.find(brigade_id).await?;
        if !brigade.is_available {
            return Err(WorkflowError::PreconditionFailed(
                "brigade is not available".to_string(),
            ));
        }
        let building = self
            .stores
            .buildings
            .find_building(building_id)
            .await?
            .ok_or(WorkflowError::NotFound("building"))?;
        if building.status != BuildingStatus::Fire {
            return Err(WorkflowError::PreconditionFailed(
                "building has no active fire alarm".to_string(),
            ));
        }

        let assignment = BrigadeAssignment {
            building_id: Some(building.building_id.clone()),
            assigned_at_ms: Some(now_ms()),
            assigned_by: Some(principal.user_id.clone()),
            status: BrigadeStatus::EnRoute,
        };
        let Some(assigned) = self
            .stores
            .brigades
            .assign_if_available(brigade_id, assignment)
            .await?
        else {
            return Err(WorkflowError::PreconditionFailed(
                "brigade is not available".to_string(),
            ));
        };

        record_brigade_assigned();
        info!(
            target: "fire.workflow",
            brigade_id = %assigned.brigade_id,
            building_id = %building.building_id,
            dispatcher = %principal.user_id,
            "brigade_assigned"
        );
        self.publisher.publish(
            &routes::brigade_assigned(&assigned.brigade_id),
            EventKind::BrigadeAssigned,
            json!({
                "brigadeId": assigned.brigade_id,
                "buildingId": building.building_id,
                "status": assigned.assignment.status.as_str(),
            }),
        );
        Ok(assigned)
    }

    /// 更新任务状态（队员或 dispatcher）。
    ///
    /// `available` 清空当前任务并恢复可用；其他状态要求存在当前任务，且只
    /// 覆盖任务状态。
    pub async fn update_status(
        &self,
        principal: &Principal,
        brigade_id: &str,
        status: &str,
    ) -> Result<BrigadeRecord, WorkflowError> {
        let next: BrigadeStatus = status
            .parse()
            .map_err(|err: ParseEnumError| WorkflowError::InvalidStatus(err.to_string()))?;
        let brigade = self.find(brigade_id).await?;
        let is_member = brigade.members.iter().any(|id| id == &principal.user_id);
        if !is_member && principal.role != Role::Dispatcher {
            return Err(WorkflowError::Forbidden);
        }

        let updated = if next == BrigadeStatus::Available {
            self.stores.brigades.release_brigade(brigade_id).await?
        } else {
            if brigade.assignment.building_id.is_none() {
                return Err(WorkflowError::PreconditionFailed(
                    "brigade is not assigned".to_string(),
                ));
            }
            let updated = self
                .stores
                .brigades
                .set_assignment_status(brigade_id, next)
                .await?;
            if updated.is_none() {
                return Err(WorkflowError::PreconditionFailed(
                    "brigade is not assigned".to_string(),
                ));
            }
            updated
        };
        let updated = updated.ok_or(WorkflowError::NotFound("brigade"))?;

        info!(
            target: "fire.workflow",
            brigade_id = %updated.brigade_id,
            status = %next,
            actor = %principal.user_id,
            "brigade_status_updated"
        );
        self.publisher.publish(
            &routes::brigade_status_updated(&updated.brigade_id),
            EventKind::BrigadeStatusUpdated,
            json!({
                "brigadeId": updated.brigade_id,
                "buildingId": updated.assignment.building_id,
                "status": next.as_str(),
            }),
        );
        Ok(updated)
    }

    async fn find(&self, brigade_id: &str) -> Result<BrigadeRecord, WorkflowError> {
        self.stores
            .brigades
            .find_brigade(brigade_id)
            .await?
            .ok_or(WorkflowError::NotFound("brigade"))
    }

    /// 队员必须存在且角色为 firefighter。
    async fn check_members(&self, members: &[String]) -> Result<(), WorkflowError> {
        for member_id in members {
            let user = self.stores.users.find_user(member_id).await?;
            match user {
                Some(user) if user.role == Role::Firefighter => {}
                Some(_) => {
                    return Err(WorkflowError::Validation(format!(
                        "member {member_id} is not a firefighter"
                    )));
                }
                None => {
                    return Err(WorkflowError::Validation(format!(
                        "member {member_id} does not exist"
                    )));
                }
            }
        }
        Ok(())
    }
}
