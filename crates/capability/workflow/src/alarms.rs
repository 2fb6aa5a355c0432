//! 告警器状态流转与告警历史
//!
//! 状态更新以比较并交换写入：读取当前状态作为期望值，由存储层在同一原子
//! 操作内完成状态写入、历史追加与楼层/建筑升级。期望值失配说明有并发写入，
//! 重新读取后再试。

use crate::{Stores, WorkflowError, authorize, new_id, now_ms};
use domain::permissions::HISTORY_GLOBAL_READ;
use domain::{AlarmStatus, ParseEnumError, Principal};
use fire_notify::{EventKind, Publisher, routes};
use fire_storage::{
    AlarmHistoryFilter, AlarmHistoryRecord, AlarmTransition, FireAlarmRecord, ResolveOutcome,
};
use fire_telemetry::record_alarm_triggered;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// 告警历史查询参数（未解析的原始输入）。
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub status: Option<String>,
}

pub struct AlarmService {
    stores: Stores,
    publisher: Arc<dyn Publisher>,
    history_limit: usize,
}

impl AlarmService {
    pub fn new(stores: Stores, publisher: Arc<dyn Publisher>, history_limit: usize) -> Self {
        Self {
            stores,
            publisher,
            history_limit,
        }
    }

    pub async fn list_by_building(
        &self,
        building_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, WorkflowError> {
        Ok(self.stores.alarms.list_alarms_by_building(building_id).await?)
    }

    pub async fn list_by_floor(&self, floor_id: &str) -> Result<Vec<FireAlarmRecord>, WorkflowError> {
        Ok(self.stores.alarms.list_alarms_by_floor(floor_id).await?)
    }

    /// 当前处于 alarm 状态的告警器。
    pub async fn list_active(&self) -> Result<Vec<FireAlarmRecord>, WorkflowError> {
        Ok(self
            .stores
            .alarms
            .list_alarms_by_status(AlarmStatus::Alarm)
            .await?)
    }

    pub async fn get(&self, alarm_id: &str) -> Result<FireAlarmRecord, WorkflowError> {
        self.stores
            .alarms
            .find_alarm(alarm_id)
            .await?
            .ok_or(WorkflowError::NotFound("alarm"))
    }

    /// 更新告警器状态。
    ///
    /// 状态不变时只刷新 lastUpdated；状态变化时追加一条历史；变为 alarm 时
    /// 将楼层与建筑置为 fire 并推送 `alarm-triggered`。回到 normal 不会自动
    /// 复位楼层与建筑。
    pub async fn update_status(
        &self,
        principal: &Principal,
        alarm_id: &str,
        status: &str,
    ) -> Result<FireAlarmRecord, WorkflowError> {
        let next: AlarmStatus = status
            .parse()
            .map_err(|err: ParseEnumError| WorkflowError::InvalidStatus(err.to_string()))?;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let current = self.get(alarm_id).await?;
            let changed = current.status != next;
            let escalate = changed && next == AlarmStatus::Alarm;
            let at_ms = now_ms();
            let history = changed.then(|| AlarmHistoryRecord {
                history_id: new_id(),
                building_id: current.building_id.clone(),
                floor_id: current.floor_id.clone(),
                alarm_id: current.alarm_id.clone(),
                status: next,
                timestamp_ms: at_ms,
                resolved_at_ms: None,
                resolved_by: None,
            });
            let transition = AlarmTransition {
                alarm_id: current.alarm_id.clone(),
                expected: current.status,
                next,
                at_ms,
                history,
                escalate,
            };
            let Some(updated) = self
                .stores
                .alarms
                .transition_alarm_status(transition)
                .await?
            else {
                continue;
            };

            if changed {
                info!(
                    target: "fire.workflow",
                    alarm_id = %updated.alarm_id,
                    building_id = %updated.building_id,
                    from = %current.status,
                    to = %updated.status,
                    actor = %principal.user_id,
                    "alarm_status_changed"
                );
            }
            if escalate {
                record_alarm_triggered();
                self.publisher.publish(
                    &routes::alarm_triggered(&updated.building_id),
                    EventKind::AlarmTriggered,
                    json!({
                        "alarmId": updated.alarm_id,
                        "buildingId": updated.building_id,
                        "floorId": updated.floor_id,
                        "status": updated.status.as_str(),
                    }),
                );
            }
            return Ok(updated);
        }

        warn!(target: "fire.workflow", alarm_id = %alarm_id, "alarm_transition_contended");
        Err(WorkflowError::Conflict(
            "alarm status changed concurrently, retry".to_string(),
        ))
    }

    /// 解除告警历史记录；只能解除一次。
    pub async fn resolve(
        &self,
        principal: &Principal,
        history_id: &str,
    ) -> Result<AlarmHistoryRecord, WorkflowError> {
        let outcome = self
            .stores
            .history
            .resolve_history(history_id, &principal.user_id, now_ms())
            .await?;
        match outcome {
            ResolveOutcome::Resolved {
                record,
                alarm_reset,
            } => {
                info!(
                    target: "fire.workflow",
                    history_id = %record.history_id,
                    alarm_id = %record.alarm_id,
                    resolved_by = %principal.user_id,
                    alarm_reset,
                    "alarm_resolved"
                );
                Ok(record)
            }
            ResolveOutcome::NotFound => Err(WorkflowError::NotFound("alarm history")),
            ResolveOutcome::AlreadyResolved => Err(WorkflowError::Conflict(
                "alarm already resolved".to_string(),
            )),
        }
    }

    /// 单栋建筑的告警历史，按时间倒序。
    pub async fn building_history(
        &self,
        building_id: &str,
        query: HistoryQuery,
    ) -> Result<Vec<AlarmHistoryRecord>, WorkflowError> {
        let status = parse_status_filter(query.status.as_deref())?;
        let filter = AlarmHistoryFilter {
            building_id: Some(building_id.to_string()),
            start_ms: query.start_ms,
            end_ms: query.end_ms,
            status,
            limit: None,
        };
        Ok(self.stores.history.list_history(filter).await?)
    }

    /// 全局告警历史（admin、dispatcher），最多 `history_limit` 条。
    pub async fn global_history(
        &self,
        principal: &Principal,
        building_id: Option<String>,
    ) -> Result<Vec<AlarmHistoryRecord>, WorkflowError> {
        authorize(principal, HISTORY_GLOBAL_READ)?;
        let filter = AlarmHistoryFilter {
            building_id: building_id.filter(|id| !id.trim().is_empty()),
            limit: Some(self.history_limit),
            ..AlarmHistoryFilter::default()
        };
        Ok(self.stores.history.list_history(filter).await?)
    }
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<AlarmStatus>, WorkflowError> {
    match status.map(str::trim).filter(|status| !status.is_empty()) {
        Some(status) => status
            .parse()
            .map(Some)
            .map_err(|err: ParseEnumError| WorkflowError::InvalidStatus(err.to_string())),
        None => Ok(None),
    }
}
