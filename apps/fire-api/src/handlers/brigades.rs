//! 消防队 handlers
//!
//! - GET /api/brigades - 列出消防队（admin、dispatcher）
//! - POST /api/brigades - 创建消防队（admin）
//! - GET /api/brigades/available - 空闲消防队（dispatcher）
//! - GET /api/brigades/:id - 消防队详情（admin、dispatcher）
//! - PUT /api/brigades/:id - 修改名称/成员（admin）
//! - DELETE /api/brigades/:id - 删除（admin，派遣中不可删除）
//! - POST /api/brigades/:id/assign - 派遣到着火建筑（dispatcher）
//! - PUT /api/brigades/:id/status - 任务状态（队员或 dispatcher）

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::normalize_required;
use crate::utils::response::{brigade_to_dto, ok, ok_with_message, workflow_error};
use api_contract::{
    AssignBrigadeRequest, CreateBrigadeRequest, StatusRequest, UpdateBrigadeRequest,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use fire_storage::{BrigadeRecord, BrigadeUpdate};
use fire_workflow::{BrigadeDraft, WorkflowError};

fn brigade_list_response(result: Result<Vec<BrigadeRecord>, WorkflowError>) -> Response {
    match result {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(brigade_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn list_brigades(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    brigade_list_response(state.brigades.list(&principal).await)
}

pub async fn list_available_brigades(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    brigade_list_response(state.brigades.available(&principal).await)
}

pub async fn get_brigade(
    State(state): State<AppState>,
    Path(brigade_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.brigades.get(&principal, &brigade_id).await {
        Ok(record) => ok(StatusCode::OK, brigade_to_dto(record)),
        Err(err) => workflow_error(err),
    }
}

pub async fn create_brigade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBrigadeRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let draft = BrigadeDraft {
        name: req.name,
        members: req.members,
    };
    match state.brigades.create(&principal, draft).await {
        Ok(record) => ok_with_message(
            StatusCode::CREATED,
            brigade_to_dto(record),
            "brigade created",
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn update_brigade(
    State(state): State<AppState>,
    Path(brigade_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateBrigadeRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let update = BrigadeUpdate {
        name: req.name,
        members: req.members,
    };
    match state.brigades.update(&principal, &brigade_id, update).await {
        Ok(record) => ok_with_message(StatusCode::OK, brigade_to_dto(record), "brigade updated"),
        Err(err) => workflow_error(err),
    }
}

pub async fn delete_brigade(
    State(state): State<AppState>,
    Path(brigade_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.brigades.delete(&principal, &brigade_id).await {
        Ok(()) => ok_with_message(
            StatusCode::OK,
            serde_json::json!({ "id": brigade_id }),
            "brigade deleted",
        ),
        Err(err) => workflow_error(err),
    }
}

/// 派遣消防队
///
/// 消防队须空闲且目标建筑处于 fire 状态，否则返回 412。
pub async fn assign_brigade(
    State(state): State<AppState>,
    Path(brigade_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AssignBrigadeRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let building_id = match normalize_required(req.building_id, "buildingId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state
        .brigades
        .assign(&principal, &brigade_id, &building_id)
        .await
    {
        Ok(record) => ok_with_message(StatusCode::OK, brigade_to_dto(record), "brigade assigned"),
        Err(err) => workflow_error(err),
    }
}

pub async fn update_brigade_status(
    State(state): State<AppState>,
    Path(brigade_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<StatusRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state
        .brigades
        .update_status(&principal, &brigade_id, req.status.trim())
        .await
    {
        Ok(record) => ok_with_message(
            StatusCode::OK,
            brigade_to_dto(record),
            "brigade status updated",
        ),
        Err(err) => workflow_error(err),
    }
}
