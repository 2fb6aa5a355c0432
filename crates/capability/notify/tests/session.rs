use domain::{Principal, Role};
use fire_notify::{
    ClientMessage, EventKind, Notification, ServerMessage, SessionError, Subscription, Topic,
    routes,
};
use serde_json::json;

fn alarm_in(building_id: &str) -> Notification {
    Notification {
        event: EventKind::AlarmTriggered,
        topics: routes::alarm_triggered(building_id),
        payload: json!({ "buildingId": building_id }),
    }
}

#[test]
fn client_messages_parse_from_json() {
    let message: ClientMessage =
        serde_json::from_str(r#"{"type":"authenticate","token":"abc"}"#).expect("parse");
    assert_eq!(
        message,
        ClientMessage::Authenticate {
            token: "abc".to_string()
        }
    );

    let message: ClientMessage =
        serde_json::from_str(r#"{"type":"subscribe_building","buildingId":"b-1"}"#)
            .expect("parse");
    assert_eq!(
        message,
        ClientMessage::SubscribeBuilding {
            building_id: "b-1".to_string()
        }
    );

    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
}

#[test]
fn unauthenticated_session_receives_nothing() {
    let mut session = Subscription::new();
    assert!(!session.wants(&alarm_in("b-1")));
    assert_eq!(
        session.subscribe_building("b-1"),
        Err(SessionError::Unauthenticated)
    );
}

#[test]
fn authentication_joins_role_and_user_topics() {
    let mut session = Subscription::new();
    let ack = session.authenticate(Principal::new("u-1", Role::Dispatcher));
    assert_eq!(ack.event, "authenticated");
    assert!(session.is_subscribed(&Topic::Role(Role::Dispatcher)));
    assert!(session.is_subscribed(&Topic::User("u-1".to_string())));
    assert!(session.wants(&alarm_in("b-9")));
}

#[test]
fn duty_officer_follows_buildings_explicitly() {
    let mut session = Subscription::new();
    session.authenticate(Principal::new("u-2", Role::Duty));
    assert!(!session.wants(&alarm_in("b-1")));

    let ack = session.subscribe_building("b-1").expect("subscribe");
    assert_eq!(ack.data["topic"], "building:b-1");
    assert!(session.wants(&alarm_in("b-1")));
    assert!(!session.wants(&alarm_in("b-2")));

    session.unsubscribe_building("b-1").expect("unsubscribe");
    assert!(!session.wants(&alarm_in("b-1")));
}

#[test]
fn only_firefighters_subscribe_to_brigades() {
    let mut session = Subscription::new();
    session.authenticate(Principal::new("u-3", Role::Dispatcher));
    assert_eq!(
        session.subscribe_brigade("br-1"),
        Err(SessionError::Forbidden)
    );

    let mut session = Subscription::new();
    session.authenticate(Principal::new("u-4", Role::Firefighter));
    session.subscribe_brigade("br-1").expect("subscribe");
    let assigned = Notification {
        event: EventKind::BrigadeAssigned,
        topics: routes::brigade_assigned("br-1"),
        payload: json!({}),
    };
    assert!(session.wants(&assigned));
}

#[test]
fn frames_carry_event_and_data() {
    let frame = ServerMessage::from_notification(&alarm_in("b-1"));
    let value = serde_json::to_value(&frame).expect("json");
    assert_eq!(value["event"], "alarm-triggered");
    assert_eq!(value["data"]["buildingId"], "b-1");

    let error = serde_json::to_value(ServerMessage::error("nope")).expect("json");
    assert_eq!(error, json!({ "event": "error", "data": { "message": "nope" } }));
}

#[test]
fn unsubscribe_works_without_authentication() {
    let mut session = Subscription::new();
    let ack = session.unsubscribe_building("b-1").expect("unsubscribe");
    assert_eq!(ack.event, "unsubscribed");
    assert_eq!(
        session.unsubscribe_building("  "),
        Err(SessionError::MissingId("buildingId"))
    );
}

#[test]
fn revoked_session_drops_principal_and_topics() {
    let mut session = Subscription::new();
    session.authenticate(Principal::new("u-4", Role::Duty));
    session.subscribe_building("b-1").expect("subscribe");
    session.revoke();
    assert!(session.principal().is_none());
    assert!(!session.is_subscribed(&Topic::Building("b-1".to_string())));
    assert!(!session.is_subscribed(&Topic::Role(Role::Duty)));
    assert!(!session.wants(&alarm_in("b-1")));
}
