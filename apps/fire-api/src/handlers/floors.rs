//! 楼层 handlers
//!
//! - POST /api/floors - 新增楼层（admin）
//! - GET /api/floors/building/:building_id - 建筑下的楼层，按楼层号排序
//! - GET /api/floors/:id - 楼层详情
//! - PUT /api/floors/:id - 编辑楼层平面图/状态（admin 直接生效，duty 进入审批）
//! - DELETE /api/floors/:id - 删除楼层及其告警器（admin）

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::response::{
    edit_outcome_response, floor_to_dto, ok, ok_with_message, workflow_error,
};
use crate::utils::{normalize_optional, parse_status};
use api_contract::{CreateFloorRequest, UpdateFloorRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::FloorPatch;
use fire_storage::AppliedChange;
use fire_workflow::FloorDraft;

pub async fn list_floors_by_building(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    match state.sites.list_floors(&building_id).await {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(floor_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn get_floor(
    State(state): State<AppState>,
    Path(floor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    match state.sites.get_floor(&floor_id).await {
        Ok(record) => ok(StatusCode::OK, floor_to_dto(record)),
        Err(err) => workflow_error(err),
    }
}

pub async fn create_floor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFloorRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let draft = FloorDraft {
        building_id: req.building_id,
        floor_number: req.floor_number,
        plan_image_path: req.plan_image_path,
    };
    match state.sites.create_floor(&principal, draft).await {
        Ok(record) => ok_with_message(StatusCode::CREATED, floor_to_dto(record), "floor created"),
        Err(err) => workflow_error(err),
    }
}

pub async fn update_floor(
    State(state): State<AppState>,
    Path(floor_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateFloorRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let plan_image_path = match normalize_optional(req.plan_image_path, "planImagePath") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let status = match parse_status(req.status.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let patch = FloorPatch {
        plan_image_path,
        status,
    };
    match state.approvals.edit_floor(&principal, &floor_id, patch).await {
        Ok(outcome) => edit_outcome_response(
            StatusCode::OK,
            outcome,
            |applied| match applied {
                AppliedChange::FloorUpdated(record) => Some(floor_to_dto(record)),
                _ => None,
            },
            "floor updated",
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn delete_floor(
    State(state): State<AppState>,
    Path(floor_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.sites.delete_floor(&principal, &floor_id).await {
        Ok(()) => ok_with_message(
            StatusCode::OK,
            serde_json::json!({ "id": floor_id }),
            "floor deleted",
        ),
        Err(err) => workflow_error(err),
    }
}
