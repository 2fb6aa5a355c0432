//! WebSocket 连接的订阅状态机。
//!
//! 连接建立后处于未认证状态，不接收任何事件。`authenticate` 成功后加入
//! `role:<role>` 与 `user:<id>`；之后可按建筑订阅/退订；仅 firefighter 可订阅
//! 消防队主题。重复认证会清空旧订阅。

use crate::{Notification, Topic};
use domain::{Principal, Role};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

/// 客户端消息。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate {
        token: String,
    },
    SubscribeBuilding {
        #[serde(rename = "buildingId")]
        building_id: String,
    },
    UnsubscribeBuilding {
        #[serde(rename = "buildingId")]
        building_id: String,
    },
    SubscribeBrigade {
        #[serde(rename = "brigadeId")]
        brigade_id: String,
    },
}

/// 服务端帧 `{"event", "data"}`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerMessage {
    pub event: String,
    pub data: Value,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            event: "error".to_string(),
            data: json!({ "message": message.into() }),
        }
    }

    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            event: notification.event.as_str().to_string(),
            data: notification.payload.clone(),
        }
    }

    fn ack(event: &str, topic: &Topic) -> Self {
        Self {
            event: event.to_string(),
            data: json!({ "topic": topic.to_string() }),
        }
    }
}

/// 订阅请求被拒绝。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("only firefighters can subscribe to brigade updates")]
    Forbidden,
    #[error("{0} required")]
    MissingId(&'static str),
}

/// 单个连接的订阅状态。
#[derive(Debug, Default)]
pub struct Subscription {
    principal: Option<Principal>,
    topics: HashSet<Topic>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_subscribed(&self, topic: &Topic) -> bool {
        self.topics.contains(topic)
    }

    pub fn authenticate(&mut self, principal: Principal) -> ServerMessage {
        self.topics.clear();
        self.topics.insert(Topic::Role(principal.role));
        self.topics.insert(Topic::User(principal.user_id.clone()));
        let data = json!({
            "userId": principal.user_id,
            "role": principal.role.as_str(),
        });
        self.principal = Some(principal);
        ServerMessage {
            event: "authenticated".to_string(),
            data,
        }
    }

    pub fn subscribe_building(&mut self, building_id: &str) -> Result<ServerMessage, SessionError> {
        self.require_principal()?;
        let topic = Topic::Building(require_id(building_id, "buildingId")?);
        let ack = ServerMessage::ack("subscribed", &topic);
        self.topics.insert(topic);
        Ok(ack)
    }

    /// 退订不要求认证；未订阅的建筑同样返回确认。
    pub fn unsubscribe_building(
        &mut self,
        building_id: &str,
    ) -> Result<ServerMessage, SessionError> {
        let topic = Topic::Building(require_id(building_id, "buildingId")?);
        self.topics.remove(&topic);
        Ok(ServerMessage::ack("unsubscribed", &topic))
    }

    pub fn subscribe_brigade(&mut self, brigade_id: &str) -> Result<ServerMessage, SessionError> {
        let principal = self.require_principal()?;
        if principal.role != Role::Firefighter {
            return Err(SessionError::Forbidden);
        }
        let topic = Topic::Brigade(require_id(brigade_id, "brigadeId")?);
        let ack = ServerMessage::ack("subscribed", &topic);
        self.topics.insert(topic);
        Ok(ack)
    }

    /// 撤销认证并清空全部订阅，连接回到初始状态。
    pub fn revoke(&mut self) {
        self.principal = None;
        self.topics.clear();
    }

    /// 通知是否应推送给本连接；未认证连接一律不推送。
    pub fn wants(&self, notification: &Notification) -> bool {
        self.principal.is_some() && notification.topics.iter().any(|topic| self.topics.contains(topic))
    }

    fn require_principal(&self) -> Result<&Principal, SessionError> {
        self.principal.as_ref().ok_or(SessionError::Unauthenticated)
    }
}

fn require_id(value: &str, field: &'static str) -> Result<String, SessionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SessionError::MissingId(field));
    }
    Ok(value.to_string())
}
