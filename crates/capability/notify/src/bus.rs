//! 进程内广播总线。

use crate::{EventKind, Notification, Publisher, Topic};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// 基于 `tokio::sync::broadcast` 的通知总线。
///
/// 每个 WebSocket 连接持有一个 Receiver，按自身订阅过滤；缓冲区满时慢消费者
/// 收到 `Lagged` 并跳过旧消息。
#[derive(Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<Arc<Notification>>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Publisher for BroadcastBus {
    fn publish(&self, topics: &[Topic], event: EventKind, payload: Value) {
        let notification = Arc::new(Notification {
            event,
            topics: topics.to_vec(),
            payload,
        });
        let receivers = self.tx.send(notification).unwrap_or(0);
        fire_telemetry::record_notification(receivers);
        debug!(
            target: "fire.notify",
            event = %event,
            topics = topics.len(),
            receivers,
            "notification_published"
        );
    }
}
