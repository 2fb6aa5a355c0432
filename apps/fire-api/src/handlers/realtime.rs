//! WebSocket 推送通道
//!
//! - GET /ws
//!
//! 每个连接持有一个广播总线 Receiver 和一份 `Subscription`。客户端消息驱动
//! 订阅状态；总线上的通知按订阅过滤后以 `{"event", "data"}` 文本帧下发。
//! 未认证的连接不会收到任何事件。推送前按认证时的令牌重新校验账号，
//! 令牌过期、账号停用或角色变更后撤销认证，客户端需重新 authenticate。

use crate::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use fire_notify::{ClientMessage, Notification, ServerMessage, Subscription};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// 单个连接：订阅状态与认证时使用的令牌。
#[derive(Debug, Default)]
pub(crate) struct Session {
    subscription: Subscription,
    token: Option<String>,
}

impl Session {
    /// 通知需要推送时返回要下发的帧；账号失效时撤销认证并返回 error 帧。
    pub(crate) async fn deliver(
        &mut self,
        state: &AppState,
        notification: &Notification,
    ) -> Option<ServerMessage> {
        if !self.subscription.wants(notification) {
            return None;
        }
        let token = self.token.as_deref()?;
        let reason = match state.auth.authenticate(token).await {
            Ok(principal) if self.subscription.principal() == Some(&principal) => {
                return Some(ServerMessage::from_notification(notification));
            }
            Ok(_) => "account role changed".to_string(),
            Err(err) => err.to_string(),
        };
        info!(target: "fire.notify", reason = %reason, "ws_session_revoked");
        self.subscription.revoke();
        self.token = None;
        Some(ServerMessage::error(format!("session revoked: {reason}")))
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.bus.subscribe();
    let mut session = Session::default();
    debug!(target: "fire.notify", "ws_connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        debug!(target: "fire.notify", error = %err, "ws_receive_failed");
                        break;
                    }
                };
                let reply = handle_client_message(&state, &mut session, &text).await;
                if !send_frame(&mut socket, &reply).await {
                    break;
                }
            }
            notification = rx.recv() => {
                match notification {
                    Ok(notification) => {
                        if let Some(frame) = session.deliver(&state, &notification).await {
                            if !send_frame(&mut socket, &frame).await {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "fire.notify", skipped, "ws_subscriber_lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    debug!(target: "fire.notify", "ws_disconnected");
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerMessage) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(err) => {
            warn!(target: "fire.notify", error = %err, "ws_encode_failed");
            return true;
        }
    };
    match socket.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(err) => {
            warn!(target: "fire.notify", error = %err, "ws_send_failed");
            false
        }
    }
}

/// 处理一条客户端消息并返回应答帧。
pub(crate) async fn handle_client_message(
    state: &AppState,
    session: &mut Session,
    text: &str,
) -> ServerMessage {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => return ServerMessage::error(format!("invalid message: {err}")),
    };
    let result = match message {
        ClientMessage::Authenticate { token } => {
            return match state.auth.authenticate(&token).await {
                Ok(principal) => {
                    session.token = Some(token);
                    session.subscription.authenticate(principal)
                }
                Err(err) => ServerMessage::error(err.to_string()),
            };
        }
        ClientMessage::SubscribeBuilding { building_id } => {
            session.subscription.subscribe_building(&building_id)
        }
        ClientMessage::UnsubscribeBuilding { building_id } => {
            session.subscription.unsubscribe_building(&building_id)
        }
        ClientMessage::SubscribeBrigade { brigade_id } => {
            session.subscription.subscribe_brigade(&brigade_id)
        }
    };
    result.unwrap_or_else(|err| ServerMessage::error(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{SECRET, test_app};
    use domain::{Principal, Role};
    use fire_auth::JwtManager;
    use fire_notify::{EventKind, Publisher, Topic, routes};
    use fire_storage::{UserStore, UserUpdate};
    use serde_json::json;

    fn token_for(principal: &Principal) -> String {
        JwtManager::new(SECRET.to_string(), 3600, 3600)
            .issue_tokens(principal)
            .expect("token")
            .access_token
    }

    #[tokio::test]
    async fn subscriptions_require_authentication() {
        let app = test_app();
        let mut session = Session::default();
        let reply = handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"subscribe_building","buildingId":"b-1"}"#,
        )
        .await;
        assert_eq!(reply.event, "error");

        let reply = handle_client_message(&app.state, &mut session, "not json").await;
        assert_eq!(reply.event, "error");

        let reply = handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"authenticate","token":"bogus"}"#,
        )
        .await;
        assert_eq!(reply.event, "error");
        assert!(session.subscription.principal().is_none());
    }

    #[tokio::test]
    async fn authenticated_session_receives_building_events() {
        let app = test_app();
        app.user_headers("user-duty", Role::Duty).await;
        let token = token_for(&Principal::new("user-duty", Role::Duty));
        let mut session = Session::default();

        let reply = handle_client_message(
            &app.state,
            &mut session,
            &json!({ "type": "authenticate", "token": token }).to_string(),
        )
        .await;
        assert_eq!(reply.event, "authenticated");
        assert_eq!(reply.data["role"], "duty");

        let reply = handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"subscribe_building","buildingId":"b-1"}"#,
        )
        .await;
        assert_eq!(reply.event, "subscribed");
        assert!(session.subscription.is_subscribed(&Topic::Building("b-1".to_string())));

        let reply = handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"subscribe_brigade","brigadeId":"br-1"}"#,
        )
        .await;
        assert_eq!(reply.event, "error");

        let mut rx = app.state.bus.subscribe();
        app.state.bus.publish(
            &routes::alarm_triggered("b-1"),
            EventKind::AlarmTriggered,
            json!({ "alarmId": "a-1" }),
        );
        let notification = rx.recv().await.expect("notification");
        let frame = session
            .deliver(&app.state, &notification)
            .await
            .expect("frame");
        assert_eq!(frame.event, "alarm-triggered");
        assert_eq!(frame.data["alarmId"], "a-1");

        let elsewhere = Notification {
            event: EventKind::AlarmTriggered,
            topics: routes::alarm_triggered("b-2"),
            payload: json!({ "alarmId": "a-2" }),
        };
        assert!(session.deliver(&app.state, &elsewhere).await.is_none());
    }

    #[tokio::test]
    async fn deactivated_account_stops_receiving_events() {
        let app = test_app();
        app.user_headers("user-duty", Role::Duty).await;
        let token = token_for(&Principal::new("user-duty", Role::Duty));
        let mut session = Session::default();
        handle_client_message(
            &app.state,
            &mut session,
            &json!({ "type": "authenticate", "token": token }).to_string(),
        )
        .await;
        handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"subscribe_building","buildingId":"b-1"}"#,
        )
        .await;

        app.store
            .update_user(
                "user-duty",
                UserUpdate {
                    is_active: Some(false),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("deactivate");

        let alarm = Notification {
            event: EventKind::AlarmTriggered,
            topics: routes::alarm_triggered("b-1"),
            payload: json!({ "alarmId": "a-1" }),
        };
        let frame = session.deliver(&app.state, &alarm).await.expect("revocation");
        assert_eq!(frame.event, "error");
        assert!(session.subscription.principal().is_none());
        assert!(session.deliver(&app.state, &alarm).await.is_none());

        let reply = handle_client_message(
            &app.state,
            &mut session,
            r#"{"type":"subscribe_building","buildingId":"b-1"}"#,
        )
        .await;
        assert_eq!(reply.event, "error");
    }
}
