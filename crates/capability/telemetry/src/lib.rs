//! 追踪、请求 ID 生成与业务计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub changes_submitted: u64,
    pub changes_approved: u64,
    pub changes_rejected: u64,
    pub alarms_triggered: u64,
    pub brigades_assigned: u64,
    pub notifications_published: u64,
    pub notifications_dropped: u64,
}

/// 进程内业务计数器。
#[derive(Default)]
pub struct TelemetryMetrics {
    changes_submitted: AtomicU64,
    changes_approved: AtomicU64,
    changes_rejected: AtomicU64,
    alarms_triggered: AtomicU64,
    brigades_assigned: AtomicU64,
    notifications_published: AtomicU64,
    notifications_dropped: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            changes_submitted: self.changes_submitted.load(Ordering::Relaxed),
            changes_approved: self.changes_approved.load(Ordering::Relaxed),
            changes_rejected: self.changes_rejected.load(Ordering::Relaxed),
            alarms_triggered: self.alarms_triggered.load(Ordering::Relaxed),
            brigades_assigned: self.brigades_assigned.load(Ordering::Relaxed),
            notifications_published: self.notifications_published.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info，`RUST_LOG` 可覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录进入审批队列的变更数。
pub fn record_change_submitted() {
    metrics().changes_submitted.fetch_add(1, Ordering::Relaxed);
}

pub fn record_change_approved() {
    metrics().changes_approved.fetch_add(1, Ordering::Relaxed);
}

pub fn record_change_rejected() {
    metrics().changes_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录告警器进入 alarm 状态的次数。
pub fn record_alarm_triggered() {
    metrics().alarms_triggered.fetch_add(1, Ordering::Relaxed);
}

pub fn record_brigade_assigned() {
    metrics().brigades_assigned.fetch_add(1, Ordering::Relaxed);
}

/// 记录通知发布；`receivers == 0` 时计为丢弃。
pub fn record_notification(receivers: usize) {
    let metrics = metrics();
    metrics
        .notifications_published
        .fetch_add(1, Ordering::Relaxed);
    if receivers == 0 {
        metrics
            .notifications_dropped
            .fetch_add(1, Ordering::Relaxed);
    }
}
