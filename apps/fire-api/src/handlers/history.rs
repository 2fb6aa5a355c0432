//! 告警历史 handlers
//!
//! - GET /api/alarm-history - 全局历史（admin、dispatcher；可按 buildingId 过滤）
//! - GET /api/alarm-history/building/:building_id - 单栋建筑历史（startDate、endDate、status）
//! - PUT /api/alarm-history/:id/resolve - 解除告警（只能解除一次）

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::response::{history_to_dto, ok, ok_with_message, workflow_error};
use api_contract::AlarmHistoryQuery;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use fire_workflow::HistoryQuery;

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<AlarmHistoryQuery>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state
        .alarms
        .global_history(&principal, query.building_id)
        .await
    {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(history_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn list_building_history(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    Query(query): Query<AlarmHistoryQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    let query = HistoryQuery {
        start_ms: query.start_date,
        end_ms: query.end_date,
        status: query.status,
    };
    match state.alarms.building_history(&building_id, query).await {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(history_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

/// 解除告警历史记录；记录对应告警器若仍在 alarm 状态则复位为 normal。
pub async fn resolve_history(
    State(state): State<AppState>,
    Path(history_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.alarms.resolve(&principal, &history_id).await {
        Ok(record) => ok_with_message(StatusCode::OK, history_to_dto(record), "alarm resolved"),
        Err(err) => workflow_error(err),
    }
}
