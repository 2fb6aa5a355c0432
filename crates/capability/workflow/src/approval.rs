//! 变更审批流
//!
//! admin 的编辑立即落库；duty 的编辑编码为 `PendingChange`（status = pending），
//! 目标实体保持不变，等待 admin 审批。审批通过时由存储层在同一原子操作内
//! 重放变更并置为 approved；驳回只写入审批字段。两种结果都会向申请人推送
//! `change-request-processed`。

use crate::{Stores, WorkflowError, authorize, now_ms};
use domain::permissions::{CHANGE_REVIEW, PLAN_EDIT};
use domain::{
    AlarmDraft, AlarmPatch, BuildingPatch, ChangeMutation, ChangeStatus, ChangeTarget, FloorPatch,
    Principal,
};
use fire_notify::{EventKind, Publisher, routes};
use fire_storage::{
    AppliedChange, ApplyOutcome, ApproveOutcome, ChangeReview, PendingChangeRecord,
};
use fire_telemetry::{record_change_approved, record_change_rejected, record_change_submitted};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// 一次编辑请求的结果。
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// 已直接落库
    Applied(AppliedChange),
    /// 已转为待审批变更
    Deferred(PendingChangeRecord),
}

/// 审批通过后的变更及其落库实体。
#[derive(Debug, Clone)]
pub struct ReviewedChange {
    pub change: PendingChangeRecord,
    pub applied: Option<AppliedChange>,
}

pub struct ApprovalService {
    stores: Stores,
    publisher: Arc<dyn Publisher>,
}

impl ApprovalService {
    pub fn new(stores: Stores, publisher: Arc<dyn Publisher>) -> Self {
        Self { stores, publisher }
    }

    /// 提交编辑：admin 直接应用，duty 转为待审批。
    ///
    /// 变体形状与引用的建筑/楼层/告警器在提交时校验。
    pub async fn request(
        &self,
        principal: &Principal,
        target: ChangeTarget,
        mutation: ChangeMutation,
    ) -> Result<EditOutcome, WorkflowError> {
        authorize(principal, PLAN_EDIT)?;
        mutation.validate(&target)?;
        self.check_references(&target).await?;

        if principal.role.applies_directly() {
            let outcome = self
                .stores
                .changes
                .apply_change(&target, &mutation, now_ms())
                .await?;
            return match outcome {
                ApplyOutcome::Applied(applied) => {
                    info!(
                        target: "fire.workflow",
                        change_type = %mutation.change_type(),
                        action = %mutation.action(),
                        building_id = %target.building_id,
                        actor = %principal.user_id,
                        "change_applied"
                    );
                    Ok(EditOutcome::Applied(applied))
                }
                ApplyOutcome::TargetMissing(entity) => Err(WorkflowError::NotFound(entity)),
            };
        }

        let record = PendingChangeRecord {
            change_id: crate::new_id(),
            target,
            mutation,
            requested_by: principal.user_id.clone(),
            requested_at_ms: now_ms(),
            status: ChangeStatus::Pending,
            reviewed_by: None,
            reviewed_at_ms: None,
            rejection_reason: None,
        };
        let record = self.stores.changes.create_change(record).await?;
        record_change_submitted();
        info!(
            target: "fire.workflow",
            change_id = %record.change_id,
            change_type = %record.change_type(),
            action = %record.mutation.action(),
            building_id = %record.target.building_id,
            requested_by = %record.requested_by,
            "change_submitted"
        );
        Ok(EditOutcome::Deferred(record))
    }

    pub async fn edit_building(
        &self,
        principal: &Principal,
        building_id: &str,
        patch: BuildingPatch,
    ) -> Result<EditOutcome, WorkflowError> {
        let target = ChangeTarget {
            building_id: building_id.to_string(),
            ..ChangeTarget::default()
        };
        self.request(principal, target, ChangeMutation::BuildingUpdate(patch))
            .await
    }

    pub async fn edit_floor(
        &self,
        principal: &Principal,
        floor_id: &str,
        patch: FloorPatch,
    ) -> Result<EditOutcome, WorkflowError> {
        authorize(principal, PLAN_EDIT)?;
        let floor = self
            .stores
            .floors
            .find_floor(floor_id)
            .await?
            .ok_or(WorkflowError::NotFound("floor"))?;
        let target = ChangeTarget {
            building_id: floor.building_id,
            floor_id: Some(floor.floor_id),
            alarm_id: None,
        };
        self.request(principal, target, ChangeMutation::FloorUpdate(patch))
            .await
    }

    pub async fn add_alarm(
        &self,
        principal: &Principal,
        building_id: &str,
        floor_id: &str,
        draft: AlarmDraft,
    ) -> Result<EditOutcome, WorkflowError> {
        let target = ChangeTarget {
            building_id: building_id.to_string(),
            floor_id: Some(floor_id.to_string()),
            alarm_id: None,
        };
        self.request(principal, target, ChangeMutation::AlarmAdd(draft))
            .await
    }

    pub async fn edit_alarm(
        &self,
        principal: &Principal,
        alarm_id: &str,
        patch: AlarmPatch,
    ) -> Result<EditOutcome, WorkflowError> {
        let target = self.alarm_target(principal, alarm_id).await?;
        self.request(principal, target, ChangeMutation::AlarmUpdate(patch))
            .await
    }

    pub async fn delete_alarm(
        &self,
        principal: &Principal,
        alarm_id: &str,
    ) -> Result<EditOutcome, WorkflowError> {
        let target = self.alarm_target(principal, alarm_id).await?;
        self.request(principal, target, ChangeMutation::AlarmDelete)
            .await
    }

    pub async fn list(
        &self,
        principal: &Principal,
        status: Option<ChangeStatus>,
    ) -> Result<Vec<PendingChangeRecord>, WorkflowError> {
        authorize(principal, CHANGE_REVIEW)?;
        Ok(self.stores.changes.list_changes(status).await?)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        change_id: &str,
    ) -> Result<PendingChangeRecord, WorkflowError> {
        authorize(principal, CHANGE_REVIEW)?;
        self.stores
            .changes
            .find_change(change_id)
            .await?
            .ok_or(WorkflowError::NotFound("change"))
    }

    /// 审批通过并重放。
    ///
    /// 已审批的记录返回 Conflict；目标实体已不存在时返回 NotFound，记录保持
    /// pending。
    pub async fn approve(
        &self,
        principal: &Principal,
        change_id: &str,
    ) -> Result<ReviewedChange, WorkflowError> {
        authorize(principal, CHANGE_REVIEW)?;
        let review = ChangeReview {
            reviewer: principal.user_id.clone(),
            reviewed_at_ms: now_ms(),
        };
        match self.stores.changes.approve_change(change_id, review).await? {
            ApproveOutcome::Approved { change, applied } => {
                record_change_approved();
                info!(
                    target: "fire.workflow",
                    change_id = %change.change_id,
                    change_type = %change.change_type(),
                    reviewer = %principal.user_id,
                    "change_approved"
                );
                self.notify_processed(&change);
                Ok(ReviewedChange {
                    change,
                    applied: Some(applied),
                })
            }
            ApproveOutcome::NotFound => Err(WorkflowError::NotFound("change")),
            ApproveOutcome::AlreadyReviewed(status) => Err(WorkflowError::Conflict(format!(
                "change already {status}"
            ))),
            ApproveOutcome::TargetMissing(entity) => {
                warn!(
                    target: "fire.workflow",
                    change_id = %change_id,
                    entity = entity,
                    "change_target_missing"
                );
                Err(WorkflowError::NotFound(entity))
            }
        }
    }

    /// 驳回：不触碰目标实体。空白理由按无理由处理。
    pub async fn reject(
        &self,
        principal: &Principal,
        change_id: &str,
        reason: Option<String>,
    ) -> Result<ReviewedChange, WorkflowError> {
        authorize(principal, CHANGE_REVIEW)?;
        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        let review = ChangeReview {
            reviewer: principal.user_id.clone(),
            reviewed_at_ms: now_ms(),
        };
        let rejected = self
            .stores
            .changes
            .reject_change(change_id, review, reason)
            .await?;
        let Some(change) = rejected else {
            return match self.stores.changes.find_change(change_id).await? {
                Some(existing) => Err(WorkflowError::Conflict(format!(
                    "change already {}",
                    existing.status
                ))),
                None => Err(WorkflowError::NotFound("change")),
            };
        };
        record_change_rejected();
        info!(
            target: "fire.workflow",
            change_id = %change.change_id,
            change_type = %change.change_type(),
            reviewer = %principal.user_id,
            "change_rejected"
        );
        self.notify_processed(&change);
        Ok(ReviewedChange {
            change,
            applied: None,
        })
    }

    async fn alarm_target(
        &self,
        principal: &Principal,
        alarm_id: &str,
    ) -> Result<ChangeTarget, WorkflowError> {
        authorize(principal, PLAN_EDIT)?;
        let alarm = self
            .stores
            .alarms
            .find_alarm(alarm_id)
            .await?
            .ok_or(WorkflowError::NotFound("alarm"))?;
        Ok(ChangeTarget {
            building_id: alarm.building_id,
            floor_id: Some(alarm.floor_id),
            alarm_id: Some(alarm.alarm_id),
        })
    }

    /// 引用的建筑必须存在，楼层与告警器必须属于该建筑。
    async fn check_references(&self, target: &ChangeTarget) -> Result<(), WorkflowError> {
        self.stores
            .buildings
            .find_building(&target.building_id)
            .await?
            .ok_or(WorkflowError::NotFound("building"))?;
        if let Some(floor_id) = target.floor_id.as_deref() {
            let floor = self
                .stores
                .floors
                .find_floor(floor_id)
                .await?
                .ok_or(WorkflowError::NotFound("floor"))?;
            if floor.building_id != target.building_id {
                return Err(WorkflowError::PreconditionFailed(
                    "floor does not belong to building".to_string(),
                ));
            }
        }
        if let Some(alarm_id) = target.alarm_id.as_deref() {
            let alarm = self
                .stores
                .alarms
                .find_alarm(alarm_id)
                .await?
                .ok_or(WorkflowError::NotFound("alarm"))?;
            if alarm.building_id != target.building_id {
                return Err(WorkflowError::PreconditionFailed(
                    "alarm does not belong to building".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn notify_processed(&self, change: &PendingChangeRecord) {
        self.publisher.publish(
            &routes::change_request_processed(&change.requested_by),
            EventKind::ChangeRequestProcessed,
            json!({
                "changeId": change.change_id,
                "status": change.status.as_str(),
                "type": change.change_type().as_str(),
            }),
        );
    }
}
