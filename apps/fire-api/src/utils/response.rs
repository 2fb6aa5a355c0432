//! HTTP 响应辅助函数和 DTO 转换
//!
//! 提供统一的响应构造函数和 DTO 转换函数：
//! - 成功响应：ok, ok_with_message
//! - 错误响应：auth_error, workflow_error, bad_request_error
//! - DTO 转换：user_to_dto, building_to_dto, floor_to_dto, alarm_to_dto, history_to_dto,
//!   brigade_to_dto, change_to_dto
//!
//! 错误码与 HTTP 状态码对应关系：
//! - AUTH.UNAUTHORIZED / AUTH.ACCOUNT_INACTIVE → 401
//! - AUTH.ACCOUNT_UNAPPROVED / AUTH.FORBIDDEN → 403
//! - RESOURCE.NOT_FOUND → 404
//! - INVALID.REQUEST / INVALID.STATUS → 400
//! - RESOURCE.CONFLICT → 409
//! - PRECONDITION.FAILED → 412
//! - INTERNAL.ERROR → 500（同时记录日志）

use api_contract::{
    AlarmDto, AlarmHistoryDto, ApiResponse, AssignmentDto, BrigadeDto, BuildingDto,
    CoordinatesDto, EditOutcomeDto, FloorDto, PendingChangeDto, UserDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fire_auth::AuthError;
use fire_storage::{
    AlarmHistoryRecord, AppliedChange, BrigadeRecord, BuildingRecord, FireAlarmRecord,
    FloorRecord, PendingChangeRecord, UserRecord,
};
use fire_workflow::{EditOutcome, WorkflowError};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// 成功响应
pub fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data))).into_response()
}

/// 成功响应并附带提示信息
pub fn ok_with_message<T: Serialize>(
    status: StatusCode,
    data: T,
    message: impl Into<String>,
) -> Response {
    (status, Json(ApiResponse::success_with_message(data, message))).into_response()
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(code, message))).into_response()
}

/// 认证错误响应
pub fn auth_error(err: AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials
        | AuthError::TokenExpired
        | AuthError::TokenInvalid
        | AuthError::Unauthenticated => {
            error_response(StatusCode::UNAUTHORIZED, "AUTH.UNAUTHORIZED", err.to_string())
        }
        AuthError::AccountInactive => error_response(
            StatusCode::UNAUTHORIZED,
            "AUTH.ACCOUNT_INACTIVE",
            err.to_string(),
        ),
        AuthError::AccountUnapproved => error_response(
            StatusCode::FORBIDDEN,
            "AUTH.ACCOUNT_UNAPPROVED",
            err.to_string(),
        ),
        AuthError::Forbidden => forbidden_error(),
        AuthError::UserNotFound => not_found_error("user"),
        AuthError::Validation(message) => bad_request_error(message),
        AuthError::Conflict(message) => conflict_error(message),
        AuthError::Internal(message) => internal_error(message),
    }
}

/// 业务错误响应
pub fn workflow_error(err: WorkflowError) -> Response {
    match err {
        WorkflowError::NotFound(entity) => not_found_error(entity),
        WorkflowError::Validation(message) => bad_request_error(message),
        WorkflowError::Conflict(message) => conflict_error(message),
        WorkflowError::InvalidStatus(message) => {
            error_response(StatusCode::BAD_REQUEST, "INVALID.STATUS", message)
        }
        WorkflowError::PreconditionFailed(message) => {
            error_response(StatusCode::PRECONDITION_FAILED, "PRECONDITION.FAILED", message)
        }
        WorkflowError::Forbidden => forbidden_error(),
        WorkflowError::Storage(message) => internal_error(message),
    }
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    error_response(StatusCode::FORBIDDEN, "AUTH.FORBIDDEN", "forbidden")
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "INVALID.REQUEST", message)
}

/// 非法状态值响应
pub fn invalid_status_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "INVALID.STATUS", message)
}

/// 资源未找到错误响应
pub fn not_found_error(entity: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "RESOURCE.NOT_FOUND",
        format!("{entity} not found"),
    )
}

fn conflict_error(message: String) -> Response {
    error_response(StatusCode::CONFLICT, "RESOURCE.CONFLICT", message)
}

fn internal_error(message: String) -> Response {
    error!(error = %message, "internal_error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL.ERROR",
        "internal server error",
    )
}

/// 编辑结果响应：已落库返回实体，已转审批返回待审批变更
pub fn edit_outcome_response<T: Serialize>(
    status: StatusCode,
    outcome: EditOutcome,
    entity: impl FnOnce(AppliedChange) -> Option<T>,
    applied_message: &str,
) -> Response {
    match outcome {
        EditOutcome::Applied(applied) => ok_with_message(
            status,
            EditOutcomeDto {
                applied: true,
                entity: entity(applied),
                pending_change: None,
            },
            applied_message,
        ),
        EditOutcome::Deferred(change) => ok_with_message(
            status,
            EditOutcomeDto::<T> {
                applied: false,
                entity: None,
                pending_change: Some(change_to_dto(change)),
            },
            "change request submitted for administrator review",
        ),
    }
}

/// 落库实体的 JSON 表示
pub fn applied_to_value(applied: AppliedChange) -> Value {
    let value = match applied {
        AppliedChange::AlarmCreated(alarm) | AppliedChange::AlarmUpdated(alarm) => {
            serde_json::to_value(alarm_to_dto(alarm))
        }
        AppliedChange::AlarmDeleted(alarm_id) => Ok(serde_json::json!({ "id": alarm_id })),
        AppliedChange::BuildingUpdated(building) => serde_json::to_value(building_to_dto(building)),
        AppliedChange::FloorUpdated(floor) => serde_json::to_value(floor_to_dto(floor)),
    };
    value.unwrap_or(Value::Null)
}

/// UserRecord 转 UserDto
pub fn user_to_dto(record: UserRecord) -> UserDto {
    UserDto {
        id: record.user_id,
        username: record.username,
        email: record.email,
        first_name: record.first_name,
        last_name: record.last_name,
        phone: record.phone,
        role: record.role.as_str().to_string(),
        is_approved: record.is_approved,
        is_active: record.is_active,
        created_at: record.created_at_ms,
    }
}

/// BuildingRecord 转 BuildingDto
pub fn building_to_dto(record: BuildingRecord) -> BuildingDto {
    BuildingDto {
        id: record.building_id,
        name: record.name,
        address: record.address,
        floors: record.floors,
        status: record.status.as_str().to_string(),
        created_by: record.created_by,
        duty_officers: record.duty_officers,
        created_at: record.created_at_ms,
        updated_at: record.updated_at_ms,
    }
}

/// FloorRecord 转 FloorDto
pub fn floor_to_dto(record: FloorRecord) -> FloorDto {
    FloorDto {
        id: record.floor_id,
        building_id: record.building_id,
        floor_number: record.floor_number,
        plan_image_path: record.plan_image_path,
        status: record.status.as_str().to_string(),
        updated_at: record.updated_at_ms,
    }
}

/// FireAlarmRecord 转 AlarmDto
pub fn alarm_to_dto(record: FireAlarmRecord) -> AlarmDto {
    AlarmDto {
        id: record.alarm_id,
        building_id: record.building_id,
        floor_id: record.floor_id,
        name: record.name,
        kind: record.kind,
        status: record.status.as_str().to_string(),
        coordinates: CoordinatesDto {
            x: record.coordinates.x,
            y: record.coordinates.y,
        },
        last_updated: record.last_updated_ms,
    }
}

/// AlarmHistoryRecord 转 AlarmHistoryDto
pub fn history_to_dto(record: AlarmHistoryRecord) -> AlarmHistoryDto {
    AlarmHistoryDto {
        id: record.history_id,
        building_id: record.building_id,
        floor_id: record.floor_id,
        alarm_id: record.alarm_id,
        status: record.status.as_str().to_string(),
        timestamp: record.timestamp_ms,
        resolved_at: record.resolved_at_ms,
        resolved_by: record.resolved_by,
    }
}

/// BrigadeRecord 转 BrigadeDto
pub fn brigade_to_dto(record: BrigadeRecord) -> BrigadeDto {
    BrigadeDto {
        id: record.brigade_id,
        name: record.name,
        members: record.members,
        is_available: record.is_available,
        current_assignment: AssignmentDto {
            building_id: record.assignment.building_id,
            assigned_at: record.assignment.assigned_at_ms,
            assigned_by: record.assignment.assigned_by,
            status: record.assignment.status.as_str().to_string(),
        },
    }
}

/// PendingChangeRecord 转 PendingChangeDto（changes 编码为 `{action, data}`）
pub fn change_to_dto(record: PendingChangeRecord) -> PendingChangeDto {
    let changes = record.mutation.to_changes().unwrap_or(Value::Null);
    PendingChangeDto {
        id: record.change_id,
        change_type: record.mutation.change_type().as_str().to_string(),
        building_id: record.target.building_id,
        floor_id: record.target.floor_id,
        alarm_id: record.target.alarm_id,
        changes,
        requested_by: record.requested_by,
        requested_at: record.requested_at_ms,
        status: record.status.as_str().to_string(),
        reviewed_by: record.reviewed_by,
        reviewed_at: record.reviewed_at_ms,
        rejection_reason: record.rejection_reason,
    }
}
