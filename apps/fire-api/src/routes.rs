//! 路由定义
//!
//! 集中管理所有路由，将路径映射到对应的 handlers：
//! - 运维探针：/health, /livez, /readyz
//! - 实时推送：/ws
//! - 认证：/api/auth/*
//! - 用户管理：/api/users/*
//! - 建筑与楼层：/api/buildings/*, /api/floors/*
//! - 告警器与告警历史：/api/alarms/*, /api/alarm-history/*
//! - 消防队：/api/brigades/*
//! - 变更审批：/api/changes/*
//! - 指标：/api/metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post, put},
};

/// 创建全部路由
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/livez", get(livez))
        .route("/readyz", get(readyz))
        .route("/ws", get(ws_handler))
        .nest("/api", create_api_router())
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/me", get(me))
        .route("/users", get(list_users))
        .route("/users/pending", get(list_pending_users))
        .route("/users/approve/:id", put(approve_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/buildings", get(list_buildings).post(create_building))
        .route("/buildings/search", get(search_buildings))
        .route(
            "/buildings/:id",
            get(get_building)
                .put(update_building)
                .delete(delete_building),
        )
        .route("/floors", post(create_floor))
        .route("/floors/building/:building_id", get(list_floors_by_building))
        .route(
            "/floors/:id",
            get(get_floor).put(update_floor).delete(delete_floor),
        )
        .route("/alarms", post(create_alarm))
        .route("/alarms/active", get(list_active_alarms))
        .route("/alarms/building/:building_id", get(list_alarms_by_building))
        .route("/alarms/floor/:floor_id", get(list_alarms_by_floor))
        .route(
            "/alarms/:id",
            get(get_alarm).put(update_alarm).delete(delete_alarm),
        )
        .route("/alarms/:id/status", put(update_alarm_status))
        .route("/alarm-history", get(list_history))
        .route(
            "/alarm-history/building/:building_id",
            get(list_building_history),
        )
        .route("/alarm-history/:id/resolve", put(resolve_history))
        .route("/brigades", get(list_brigades).post(create_brigade))
        .route("/brigades/available", get(list_available_brigades))
        .route(
            "/brigades/:id",
            get(get_brigade)
                .put(update_brigade)
                .delete(delete_brigade),
        )
        .route("/brigades/:id/assign", put(assign_brigade))
        .route("/brigades/:id/status", put(update_brigade_status))
        .route("/changes", get(list_changes))
        .route("/changes/:id", get(get_change))
        .route("/changes/:id/approve", put(approve_change))
        .route("/changes/:id/reject", put(reject_change))
        .route("/metrics", get(get_metrics))
}
