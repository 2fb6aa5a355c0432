//! 通知总线：按主题（角色/建筑/消防队/用户）广播事件。
//!
//! 业务层只依赖 `Publisher`，发布是同步、即发即弃的，投递失败不会影响触发它的
//! 请求。一次发布携带全部目标主题，同时订阅多个主题的连接只收到一次。
//!
//! - `BroadcastBus`（`bus.rs`）：基于 `tokio::sync::broadcast` 的进程内实现
//! - `MemoryPublisher`：记录所有通知，用于测试
//! - `NoopPublisher`：丢弃所有通知
//! - `Subscription`（`session.rs`）：WebSocket 连接的订阅状态机

mod bus;
pub mod routes;
mod session;

use domain::Role;
use serde_json::Value;
use std::fmt;
use std::sync::Mutex;

pub use bus::BroadcastBus;
pub use session::{ClientMessage, ServerMessage, SessionError, Subscription};

/// 广播主题。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Role(Role),
    Building(String),
    Brigade(String),
    User(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role:{role}"),
            Self::Building(id) => write!(f, "building:{id}"),
            Self::Brigade(id) => write!(f, "brigade:{id}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// 事件名（客户端按字面值匹配）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AlarmTriggered,
    BrigadeAssigned,
    BrigadeStatusUpdated,
    ChangeRequestProcessed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlarmTriggered => "alarm-triggered",
            Self::BrigadeAssigned => "brigade-assigned",
            Self::BrigadeStatusUpdated => "brigade-status-updated",
            Self::ChangeRequestProcessed => "change-request-processed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次发布。
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub event: EventKind,
    pub topics: Vec<Topic>,
    pub payload: Value,
}

impl Notification {
    pub fn targets(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }
}

/// 通知发布接口，由调用方注入。
pub trait Publisher: Send + Sync {
    fn publish(&self, topics: &[Topic], event: EventKind, payload: Value);
}

/// 丢弃所有通知。
#[derive(Debug, Default)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _topics: &[Topic], _event: EventKind, _payload: Value) {}
}

/// 记录所有通知。
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已发布通知的副本。
    pub fn notifications(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.notifications()
            .into_iter()
            .map(|notification| notification.event)
            .collect()
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&self, topics: &[Topic], event: EventKind, payload: Value) {
        let notification = Notification {
            event,
            topics: topics.to_vec(),
            payload,
        };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
