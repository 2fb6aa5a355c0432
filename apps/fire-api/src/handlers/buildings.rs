//! 建筑 handlers
//!
//! - GET /api/buildings - 列出建筑（任意已认证用户）
//! - GET /api/buildings/search?query= - 名称或地址模糊搜索
//! - POST /api/buildings - 创建建筑（admin）
//! - GET /api/buildings/:id - 建筑详情
//! - PUT /api/buildings/:id - 编辑建筑（admin 直接生效，duty 进入审批）
//! - DELETE /api/buildings/:id - 删除建筑及其楼层、告警器（admin）

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::response::{
    building_to_dto, edit_outcome_response, ok, ok_with_message, workflow_error,
};
use crate::utils::{normalize_optional, normalize_required, parse_status};
use api_contract::{BuildingSearchQuery, CreateBuildingRequest, UpdateBuildingRequest};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::BuildingPatch;
use fire_storage::AppliedChange;
use fire_workflow::BuildingDraft;

pub async fn list_buildings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    match state.sites.list_buildings().await {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(building_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn search_buildings(
    State(state): State<AppState>,
    Query(query): Query<BuildingSearchQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    let query = match normalize_required(query.query.unwrap_or_default(), "query") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.sites.search_buildings(&query).await {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(building_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn get_building(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_principal(&state, &headers).await {
        return response;
    }
    match state.sites.get_building(&building_id).await {
        Ok(record) => ok(StatusCode::OK, building_to_dto(record)),
        Err(err) => workflow_error(err),
    }
}

/// 创建建筑，返回 201
pub async fn create_building(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBuildingRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let draft = BuildingDraft {
        name: req.name,
        address: req.address,
        floors: req.floors,
        duty_officers: req.duty_officers,
    };
    match state.sites.create_building(&principal, draft).await {
        Ok(record) => ok_with_message(
            StatusCode::CREATED,
            building_to_dto(record),
            "building created",
        ),
        Err(err) => workflow_error(err),
    }
}

/// 编辑建筑
///
/// admin 的修改立即落库并返回新实体；duty 的修改生成 `building-plan` 类型的
/// 待审批变更。
pub async fn update_building(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateBuildingRequest>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let name = match normalize_optional(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let address = match normalize_optional(req.address, "address") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let status = match parse_status(req.status.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let patch = BuildingPatch {
        name,
        address,
        floors: req.floors,
        status,
        duty_officers: req.duty_officers,
    };
    match state
        .approvals
        .edit_building(&principal, &building_id, patch)
        .await
    {
        Ok(outcome) => edit_outcome_response(
            StatusCode::OK,
            outcome,
            |applied| match applied {
                AppliedChange::BuildingUpdated(record) => Some(building_to_dto(record)),
                _ => None,
            },
            "building updated",
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn delete_building(
    State(state): State<AppState>,
    Path(building_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.sites.delete_building(&principal, &building_id).await {
        Ok(()) => ok_with_message(
            StatusCode::OK,
            serde_json::json!({ "id": building_id }),
            "building deleted",
        ),
        Err(err) => workflow_error(err),
    }
}
