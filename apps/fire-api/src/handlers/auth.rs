//! 认证相关 handlers：健康检查、注册、登录、刷新 token、当前用户
//!
//! ## 提供的端点
//!
//! ### 公开端点（无需认证）
//! - `GET /health`、`GET /livez` - 存活探针，返回 `{"ok": true}`
//! - `GET /readyz` - 就绪探针（配置了 Postgres 时检查连接）
//! - `POST /api/auth/register` - 注册账户，非 admin 账户需等待审批
//! - `POST /api/auth/login` - 邮箱密码登录，返回 access/refresh token
//! - `POST /api/auth/refresh-token` - 使用 refresh token 换取新的 token 对
//!
//! ### 私有端点（需 Bearer token 认证）
//! - `GET /api/auth/me` - 当前用户资料
//!
//! ## 登录流程
//! 1. 客户端发送邮箱和密码
//! 2. `AuthService::login()` 校验凭据，再检查 isActive / isApproved
//! 3. 返回 access token、refresh token、过期时间（Unix 毫秒）和用户资料

use crate::AppState;
use crate::middleware::require_principal;
use crate::utils::response::{auth_error, ok, ok_with_message, user_to_dto};
use api_contract::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::Role;
use fire_auth::Registration;

/// 健康检查端点，等同于 livez
pub async fn health() -> impl IntoResponse {
    livez().await
}

/// Liveness 探针：只反映进程存活，不做外部依赖检查。
pub async fn livez() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// Readiness 探针：配置了 Postgres 时检查连接，内存模式直接就绪。
pub async fn readyz(State(state): State<AppState>) -> Response {
    let Some(pool) = state.db_pool.as_ref() else {
        return (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response();
    };

    match sqlx::query_scalar::<_, i32>("select 1").fetch_one(pool).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "readyz check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "ok": false })),
            )
                .into_response()
        }
    }
}

/// 注册账户
///
/// admin 账户立即可用；其余角色创建后处于待审批状态，登录前需管理员审批。
///
/// # Errors
///
/// - `400 BAD REQUEST`: 字段缺失、邮箱格式或密码长度不合法、角色未知
/// - `409 CONFLICT`: 用户名或邮箱已存在
pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> Response {
    let registration = Registration {
        username: req.username,
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        role: req.role,
    };
    match state.auth.register(registration).await {
        Ok(user) => {
            let message = if user.role == Role::Admin {
                "user registered"
            } else {
                "user registered, awaiting administrator approval"
            };
            ok_with_message(StatusCode::CREATED, user_to_dto(user), message)
        }
        Err(err) => auth_error(err),
    }
}

/// 登录接口
///
/// # Errors
///
/// - `401 UNAUTHORIZED`: 邮箱不存在或密码错误、账户已停用
/// - `403 FORBIDDEN`: 账户尚未审批
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.email, &req.password).await {
        Ok((user, tokens)) => {
            let response = LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                // 秒级时间戳转毫秒
                expires: tokens.expires_at.saturating_mul(1000),
                user: user_to_dto(user),
            };
            ok(StatusCode::OK, response)
        }
        Err(err) => auth_error(err),
    }
}

/// 刷新 access token
///
/// 每个 refresh token 只能使用一次，成功后返回新的 token 对。
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Response {
    match state.auth.refresh(&req.refresh_token).await {
        Ok(tokens) => {
            let response = RefreshTokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires: tokens.expires_at.saturating_mul(1000),
            };
            ok(StatusCode::OK, response)
        }
        Err(err) => auth_error(err),
    }
}

/// 当前用户资料
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match state.auth.profile(&principal).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}
