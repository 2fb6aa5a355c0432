//! 火灾报警监控 HTTP API 与 WebSocket 推送服务。

mod handlers;
mod middleware;
mod routes;
mod utils;

use axum::{Router, middleware as axum_middleware};
use fire_auth::{AuthService, JwtManager};
use fire_config::AppConfig;
use fire_notify::{BroadcastBus, Publisher};
use fire_storage::{InMemoryStore, PgStore};
use fire_telemetry::init_tracing;
use fire_workflow::{AlarmService, ApprovalService, BrigadeService, SiteService, Stores};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub approvals: Arc<ApprovalService>,
    pub alarms: Arc<AlarmService>,
    pub brigades: Arc<BrigadeService>,
    pub sites: Arc<SiteService>,
    pub bus: BroadcastBus,
    /// 内存模式下为 None
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        stores: Stores,
        jwt: JwtManager,
        bus: BroadcastBus,
        history_limit: usize,
        db_pool: Option<PgPool>,
    ) -> Self {
        let publisher: Arc<dyn Publisher> = Arc::new(bus.clone());
        Self {
            auth: Arc::new(AuthService::new(stores.users.clone(), jwt)),
            approvals: Arc::new(ApprovalService::new(stores.clone(), publisher.clone())),
            alarms: Arc::new(AlarmService::new(
                stores.clone(),
                publisher.clone(),
                history_limit,
            )),
            brigades: Arc::new(BrigadeService::new(stores.clone(), publisher)),
            sites: Arc::new(SiteService::new(stores)),
            bus,
            db_pool,
        }
    }
}

/// 组装路由与全局中间件
pub fn build_app(state: AppState) -> Router {
    routes::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(axum_middleware::from_fn(middleware::request_context))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    let (stores, db_pool) = match config.database_url.as_deref() {
        Some(database_url) => {
            // Postgres 存储（需先执行 migrations）
            let store = Arc::new(PgStore::connect(database_url, config.db_max_connections).await?);
            let pool = store.pool.clone();
            (Stores::from_backend(store), Some(pool))
        }
        None => {
            warn!("FIRE_DATABASE_URL not set, falling back to in-memory store");
            let store = if config.seed_admin {
                InMemoryStore::with_default_admin()
            } else {
                InMemoryStore::new()
            };
            (Stores::from_backend(Arc::new(store)), None)
        }
    };

    let jwt = JwtManager::new(
        config.jwt_secret.clone(),
        config.jwt_access_ttl_seconds,
        config.jwt_refresh_ttl_seconds,
    );
    let bus = BroadcastBus::new(config.notify_capacity);
    let state = AppState::new(stores, jwt, bus, config.history_limit, db_pool);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "fire_api_listening");
    axum::serve(listener, app).await?;
    Ok(())
}
