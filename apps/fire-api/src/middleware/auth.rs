//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token：从 Authorization 头提取 Bearer token
//! - require_principal：访问控制闸门，解析当前主体并校验账户状态
//! - require_role：校验主体角色是否在给定集合内
//!
//! 认证流程：
//! 1. request_context：在所有请求前注入追踪 ID
//! 2. bearer_token：从请求头提取 token
//! 3. require_principal：验证 JWT 签名，重新读取用户，检查 isActive / isApproved
//! 4. require_role：按接口要求的角色集合放行

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use domain::{Principal, Role};
use fire_auth::AuthError;
use fire_telemetry::new_request_ids;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::auth_error;

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response: Response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 验证 token 并解析当前主体
pub async fn require_principal(state: &AppState, headers: &HeaderMap) -> Result<Principal, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(auth_error(AuthError::Unauthenticated));
    };
    state.auth.authenticate(token).await.map_err(auth_error)
}

/// 校验主体角色
pub fn require_role(principal: &Principal, roles: &[Role]) -> Result<(), Response> {
    fire_auth::require_role(principal, roles).map_err(auth_error)
}
