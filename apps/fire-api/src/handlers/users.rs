//! 用户管理 handlers（仅 admin）
//!
//! - GET /api/users - 全部用户
//! - GET /api/users/pending - 待审批用户
//! - PUT /api/users/approve/:id - 审批用户
//! - GET /api/users/:id - 用户详情
//! - PUT /api/users/:id - 部分更新（口令重新哈希）
//! - DELETE /api/users/:id - 删除用户
//!
//! 消防队成员必须保持 firefighter 角色；改为其他角色或删除前需先移出消防队。

use crate::AppState;
use crate::middleware::{require_principal, require_role};
use crate::utils::response::{auth_error, ok, ok_with_message, user_to_dto, workflow_error};
use api_contract::UpdateUserRequest;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::{Principal, Role, permissions};
use fire_auth::UserChanges;

async fn require_user_admin(state: &AppState, headers: &HeaderMap) -> Result<Principal, Response> {
    let principal = require_principal(state, headers).await?;
    require_role(&principal, permissions::USER_ADMIN)?;
    Ok(principal)
}

pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    match state.auth.list_users(false).await {
        Ok(users) => ok(
            StatusCode::OK,
            users.into_iter().map(user_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => auth_error(err),
    }
}

pub async fn list_pending_users(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    match state.auth.list_users(true).await {
        Ok(users) => ok(
            StatusCode::OK,
            users.into_iter().map(user_to_dto).collect::<Vec<_>>(),
        ),
        Err(err) => auth_error(err),
    }
}

pub async fn approve_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    match state.auth.approve_user(&user_id).await {
        Ok(user) => ok_with_message(StatusCode::OK, user_to_dto(user), "user approved"),
        Err(err) => auth_error(err),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    match state.auth.get_user(&user_id).await {
        Ok(user) => ok(StatusCode::OK, user_to_dto(user)),
        Err(err) => auth_error(err),
    }
}

/// 部分更新用户；未提供的字段保持不变。
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    let leaves_firefighters = req
        .role
        .as_deref()
        .and_then(|role| role.trim().parse::<Role>().ok())
        .is_some_and(|role| role != Role::Firefighter);
    if leaves_firefighters {
        if let Err(err) = state.brigades.ensure_not_member(&user_id).await {
            return workflow_error(err);
        }
    }
    let changes = UserChanges {
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        role: req.role,
        is_active: req.is_active,
        is_approved: req.is_approved,
        password: req.password,
    };
    match state.auth.update_user(&user_id, changes).await {
        Ok(user) => ok_with_message(StatusCode::OK, user_to_dto(user), "user updated"),
        Err(err) => auth_error(err),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_user_admin(&state, &headers).await {
        return response;
    }
    if let Err(err) = state.brigades.ensure_not_member(&user_id).await {
        return workflow_error(err);
    }
    match state.auth.delete_user(&user_id).await {
        Ok(()) => ok_with_message(
            StatusCode::OK,
            serde_json::json!({ "id": user_id }),
            "user deleted",
        ),
        Err(err) => auth_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use fire_storage::BrigadeUpdate;
    use fire_workflow::BrigadeDraft;
    use serde_json::json;

    #[tokio::test]
    async fn only_admins_manage_users() {
        let app = test_app();
        let headers = app.user_headers("user-duty", Role::Duty).await;
        let response = list_users(State(app.state.clone()), headers).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = list_users(State(app.state.clone()), app.admin_headers()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn approving_unknown_user_is_not_found() {
        let app = test_app();
        let response = approve_user(
            State(app.state.clone()),
            Path("ghost".to_string()),
            app.admin_headers(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn brigade_members_keep_firefighter_role() {
        let app = test_app();
        app.user_headers("ff-1", Role::Firefighter).await;
        let admin = Principal::new("user-admin", Role::Admin);
        let brigade = app
            .state
            .brigades
            .create(
                &admin,
                BrigadeDraft {
                    name: "Engine 7".to_string(),
                    members: vec!["ff-1".to_string()],
                },
            )
            .await
            .expect("brigade");

        let demote: UpdateUserRequest =
            serde_json::from_value(json!({ "role": "duty" })).expect("request");
        let response = update_user(
            State(app.state.clone()),
            Path("ff-1".to_string()),
            app.admin_headers(),
            Json(demote),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

        let response = delete_user(
            State(app.state.clone()),
            Path("ff-1".to_string()),
            app.admin_headers(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        let user = app.state.auth.get_user("ff-1").await.expect("still present");
        assert_eq!(user.role, Role::Firefighter);

        let rename: UpdateUserRequest =
            serde_json::from_value(json!({ "firstName": "Ada", "role": "firefighter" }))
                .expect("request");
        let response = update_user(
            State(app.state.clone()),
            Path("ff-1".to_string()),
            app.admin_headers(),
            Json(rename),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        app.state
            .brigades
            .update(
                &admin,
                &brigade.brigade_id,
                BrigadeUpdate {
                    members: Some(Vec::new()),
                    ..BrigadeUpdate::default()
                },
            )
            .await
            .expect("remove member");
        let response = delete_user(
            State(app.state.clone()),
            Path("ff-1".to_string()),
            app.admin_headers(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
