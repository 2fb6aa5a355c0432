//! 告警器 handlers
//!
//! - POST /api/alarms - 新增告警器（admin 直接生效，duty 进入审批；均返回 201）
//! - GET /api/alarms/building/:building_id - 建筑下的告警器
//! - GET /api/alarms/floor/:floor_id - 楼层下的告警器
//! - GET /api/alarms/active - 当前处于 alarm 状态的告警器
//! - GET /api/alarms/:id - 告警器详情
//! - PUT /api/alarms/:id - 编辑名称、类型、坐标（不改变状态）
//! - DELETE /api/alarms/:id - 删除告警器
//! - PUT /api/alarms/:id/status - 状态流转（任意已认证用户）
//!
//! 状态只能通过 `/status` 接口变更；进入 alarm 时楼层与建筑同时置为 fire，
//! 并推送 `alarm-triggered`。

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::response::{
    alarm_to_dto, edit_outcome_response, ok, ok_with_message, workflow_error,
};
use crate::utils::{normalize_optional, normalize_required};
use api_contract::{AlarmDto, CreateAlarmRequest, StatusRequest, UpdateAlarmRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::{AlarmDraft, AlarmPatch, Coordinates};
use fire_storage::{AppliedChange, FireAlarmRecord};
use fire_workflow::WorkflowError;

fn alarm_list_response(result: Result<Vec<FireAlarmRecord>, WorkflowError>) -> Response {
    match result {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(alarm_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

fn applied_alarm(applied: AppliedChange) -> Option<AlarmDto> {
    match applied {
        AppliedChange::AlarmCreated(record) | AppliedChange::AlarmUpdated(record) => {
            Some(alarm_to_dto(record))
        }
        _ => None,
    }
}

pub async fn list_alarms_by_building(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    alarm_list_response(state.alarms.list_by_building(&building_id).await)
}

pub async fn list_alarms_by_floor(
    State(state): State<AppState>,
    Path(floor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    alarm_list_response(state.alarms.list_by_floor(&floor_id).await)
}

pub async fn list_active_alarms(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    alarm_list_response(state.alarms.list_active().await)
}

pub async fn get_alarm(
    State(state): State<AppState>,
    Path(alarm_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    match state.alarms.get(&alarm_id).await {
        Ok(record) => ok(StatusCode::OK, alarm_to_dto(record)),
        Err(err) => workflow_error(err),
    }
}

pub async fn create_alarm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAlarmRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let building_id = match normalize_required(req.building_id, "buildingId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let floor_id = match normalize_required(req.floor_id, "floorId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let draft = AlarmDraft {
        name: req.name,
        kind: req.kind,
        coordinates: Coordinates {
            x: req.coordinates.x,
            y: req.coordinates.y,
        },
    };
    match state
        .approvals
        .add_alarm(&principal, &building_id, &floor_id, draft)
        .await
    {
        Ok(outcome) => {
            edit_outcome_response(StatusCode::CREATED, outcome, applied_alarm, "alarm created")
        }
        Err(err) => workflow_error(err),
    }
}

pub async fn update_alarm(
    State(state): State<AppState>,
    Path(alarm_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateAlarmRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let name = match normalize_optional(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let kind = match normalize_optional(req.kind, "type") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let patch = AlarmPatch {
        name,
        kind,
        coordinates: req
            .coordinates
            .map(|coordinates| Coordinates {
                x: coordinates.x,
                y: coordinates.y,
            }),
    };
    match state.approvals.edit_alarm(&principal, &alarm_id, patch).await {
        Ok(outcome) => {
            edit_outcome_response(StatusCode::OK, outcome, applied_alarm, "alarm updated")
        }
        Err(err) => workflow_error(err),
    }
}

pub async fn delete_alarm(
    State(state): State<AppState>,
    Path(alarm_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.approvals.delete_alarm(&principal, &alarm_id).await {
        Ok(outcome) => edit_outcome_response(
            StatusCode::OK,
            outcome,
            |applied| match applied {
                AppliedChange::AlarmDeleted(alarm_id) => {
                    Some(serde_json::json!({ "id": alarm_id }))
                }
                _ => None,
            },
            "alarm deleted",
        ),
        Err(err) => workflow_error(err),
    }
}

/// 告警器状态流转
///
/// 状态未变化时不写历史；变为 alarm 时推送 `alarm-triggered`。
pub async fn update_alarm_status(
    State(state): State<AppState>,
    Path(alarm_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<StatusRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state
        .alarms
        .update_status(&principal, &alarm_id, req.status.trim())
        .await
    {
        Ok(record) => ok_with_message(
            StatusCode::OK,
            alarm_to_dto(record),
            "alarm status updated",
        ),
        Err(err) => workflow_error(err),
    }
}
