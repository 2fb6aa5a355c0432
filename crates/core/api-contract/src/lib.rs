//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// 成功响应并附带提示信息（变更类接口使用）。
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            data: None,
            message: Some(message.clone()),
            error: Some(ApiError {
                code: code.into(),
                message,
            }),
        }
    }
}

/// 注册请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
    pub user: UserDto,
}

/// 刷新 token 请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// 刷新 token 响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
}

/// 用户返回结构（不含口令）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at: i64,
}

/// 用户更新请求体（admin）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub password: Option<String>,
}

/// 建筑创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingRequest {
    pub name: String,
    pub address: String,
    pub floors: i32,
    #[serde(default)]
    pub duty_officers: Vec<String>,
}

/// 建筑更新请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuildingRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub floors: Option<i32>,
    pub status: Option<String>,
    pub duty_officers: Option<Vec<String>>,
}

/// 建筑搜索参数。
#[derive(Debug, Deserialize)]
pub struct BuildingSearchQuery {
    pub query: Option<String>,
}

/// 建筑返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub floors: i32,
    pub status: String,
    pub created_by: String,
    pub duty_officers: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 楼层创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorRequest {
    pub building_id: String,
    pub floor_number: i32,
    pub plan_image_path: String,
}

/// 楼层更新请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFloorRequest {
    pub plan_image_path: Option<String>,
    pub status: Option<String>,
}

/// 楼层返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorDto {
    pub id: String,
    pub building_id: String,
    pub floor_number: i32,
    pub plan_image_path: String,
    pub status: String,
    pub updated_at: i64,
}

/// 平面图坐标。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoordinatesDto {
    pub x: f64,
    pub y: f64,
}

/// 告警器创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlarmRequest {
    pub building_id: String,
    pub floor_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: CoordinatesDto,
}

/// 告警器更新请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlarmRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub coordinates: Option<CoordinatesDto>,
}

/// 状态更新请求体（告警器 / 消防队共用）。
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// 告警器返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDto {
    pub id: String,
    pub building_id: String,
    pub floor_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub coordinates: CoordinatesDto,
    pub last_updated: i64,
}

/// 告警历史查询参数。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmHistoryQuery {
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub status: Option<String>,
    pub building_id: Option<String>,
}

/// 告警历史返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmHistoryDto {
    pub id: String,
    pub building_id: String,
    pub floor_id: String,
    pub alarm_id: String,
    pub status: String,
    pub timestamp: i64,
    pub resolved_at: Option<i64>,
    pub resolved_by: Option<String>,
}

/// 消防队创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrigadeRequest {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// 消防队更新请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrigadeRequest {
    pub name: Option<String>,
    pub members: Option<Vec<String>>,
}

/// 消防队派遣请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBrigadeRequest {
    pub building_id: String,
}

/// 消防队当前任务。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub building_id: Option<String>,
    pub assigned_at: Option<i64>,
    pub assigned_by: Option<String>,
    pub status: String,
}

/// 消防队返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrigadeDto {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub is_available: bool,
    pub current_assignment: AssignmentDto,
}

/// 变更请求列表参数。
#[derive(Debug, Default, Deserialize)]
pub struct ChangeListQuery {
    pub status: Option<String>,
}

/// 驳回请求体。
#[derive(Debug, Default, Deserialize)]
pub struct RejectChangeRequest {
    pub reason: Option<String>,
}

/// 变更请求返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChangeDto {
    pub id: String,
    #[serde(rename = "type")]
    pub change_type: String,
    pub building_id: String,
    pub floor_id: Option<String>,
    pub alarm_id: Option<String>,
    pub changes: serde_json::Value,
    pub requested_by: String,
    pub requested_at: i64,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<i64>,
    pub rejection_reason: Option<String>,
}

/// 受审批约束的编辑结果：直接生效时带实体，延迟时带变更请求。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcomeDto<T> {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_change: Option<PendingChangeDto>,
}

/// 审批结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReviewDto {
    pub change: PendingChangeDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<serde_json::Value>,
}

/// 计数指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub changes_submitted: u64,
    pub changes_approved: u64,
    pub changes_rejected: u64,
    pub alarms_triggered: u64,
    pub brigades_assigned: u64,
    pub notifications_published: u64,
    pub notifications_dropped: u64,
}
