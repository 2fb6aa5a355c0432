//! 计数指标快照。
//!
//! - GET /api/metrics（admin）

use api_contract::MetricsSnapshotDto;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use domain::permissions;
use fire_telemetry::metrics;

use crate::{
    AppState,
    middleware::{require_principal, require_role},
    utils::response::ok,
};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let principal = match require_principal(&state, &headers).await {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    if let Err(response) = require_role(&principal, permissions::METRICS_READ) {
        return response;
    }

    let snapshot = metrics().snapshot();
    ok(
        StatusCode::OK,
        MetricsSnapshotDto {
            changes_submitted: snapshot.changes_submitted,
            changes_approved: snapshot.changes_approved,
            changes_rejected: snapshot.changes_rejected,
            alarms_triggered: snapshot.alarms_triggered,
            brigades_assigned: snapshot.brigades_assigned,
            notifications_published: snapshot.notifications_published,
            notifications_dropped: snapshot.notifications_dropped,
        },
    )
}
