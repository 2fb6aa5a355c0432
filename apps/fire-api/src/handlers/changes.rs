//! 变更审批 handlers（仅 admin）
//!
//! - GET /api/changes?status= - 变更请求列表，按提交时间倒序
//! - GET /api/changes/:id - 变更请求详情
//! - PUT /api/changes/:id/approve - 审批通过并重放到目标实体
//! - PUT /api/changes/:id/reject - 驳回（可附原因）
//!
//! 审批流程：
//! 1. 只有 pending 状态的变更可以审批，否则返回 409
//! 2. 通过时按变更类型重放；目标已不存在则返回 404，变更保持 pending
//! 3. 通过或驳回后向提交人推送 `change-request-processed`

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::parse_status;
use crate::utils::response::{
    applied_to_value, change_to_dto, ok, ok_with_message, workflow_error,
};
use api_contract::{ChangeListQuery, ChangeReviewDto, RejectChangeRequest};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use fire_workflow::ReviewedChange;

fn review_to_dto(review: ReviewedChange) -> ChangeReviewDto {
    ChangeReviewDto {
        change: change_to_dto(review.change),
        applied: review.applied.map(applied_to_value),
    }
}

pub async fn list_changes(
    State(state): State<AppState>,
    Query(query): Query<ChangeListQuery>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let status = match parse_status(query.status.as_deref()) {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.approvals.list(&principal, status).await {
        Ok(items) => ok(
            StatusCode::OK,
            items.into_iter().map(change_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => workflow_error(err),
    }
}

pub async fn get_change(
    State(state): State<AppState>,
    Path(change_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.approvals.get(&principal, &change_id).await {
        Ok(record) => ok(StatusCode::OK, change_to_dto(record)),
        Err(err) => workflow_error(err),
    }
}

pub async fn approve_change(
    State(state): State<AppState>,
    Path(change_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.approvals.approve(&principal, &change_id).await {
        Ok(review) => ok_with_message(StatusCode::OK, review_to_dto(review), "change approved"),
        Err(err) => workflow_error(err),
    }
}

/// 驳回变更请求；请求体可省略。
pub async fn reject_change(
    State(state): State<AppState>,
    Path(change_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<RejectChangeRequest>>,
) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    let reason = body.and_then(|Json(req)| req.reason);
    match state
        .approvals
        .reject(&principal, &change_id, reason)
        .await
    {
        Ok(review) => ok_with_message(StatusCode::OK, review_to_dto(review), "change rejected"),
        Err(err) => workflow_error(err),
    }
}
