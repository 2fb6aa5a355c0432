use domain::{AlarmDraft, AlarmStatus, BuildingStatus, Coordinates, Principal, Role};
use fire_notify::{EventKind, MemoryPublisher, Topic};
use fire_storage::{
    AlarmHistoryFilter, AlarmHistoryStore, AppliedChange, BuildingRecord, BuildingStore,
    FloorRecord, FloorStore, InMemoryStore,
};
use fire_workflow::{AlarmService, ApprovalService, EditOutcome, HistoryQuery, Stores, WorkflowError};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    store: Arc<InMemoryStore>,
    publisher: Arc<MemoryPublisher>,
    alarms: AlarmService,
    alarm_id: String,
}

async fn fixture() -> Fixture {
    fixture_with_limit(100).await
}

async fn fixture_with_limit(history_limit: usize) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    store
        .create_building(BuildingRecord {
            building_id: "b-1".to_string(),
            name: "Depot".to_string(),
            address: "9 Quay St".to_string(),
            floors: 2,
            status: BuildingStatus::Normal,
            created_by: "user-admin".to_string(),
            duty_officers: Vec::new(),
            created_at_ms: 1_000,
            updated_at_ms: 1_000,
        })
        .await
        .expect("building");
    store
        .create_floor(FloorRecord {
            floor_id: "f-1".to_string(),
            building_id: "b-1".to_string(),
            floor_number: 1,
            plan_image_path: "/plans/f-1.png".to_string(),
            status: BuildingStatus::Normal,
            updated_at_ms: 1_000,
        })
        .await
        .expect("floor");

    let stores = Stores::from_backend(store.clone());
    let publisher = Arc::new(MemoryPublisher::new());
    let approvals = ApprovalService::new(stores.clone(), publisher.clone());
    let created = approvals
        .add_alarm(
            &Principal::new("user-admin", Role::Admin),
            "b-1",
            "f-1",
            AlarmDraft {
                name: "Kitchen".to_string(),
                kind: "heat".to_string(),
                coordinates: Coordinates { x: 3.0, y: 4.0 },
            },
        )
        .await
        .expect("alarm");
    let alarm_id = match created {
        EditOutcome::Applied(AppliedChange::AlarmCreated(alarm)) => alarm.alarm_id,
        other => panic!("unexpected outcome: {other:?}"),
    };
    Fixture {
        store,
        publisher: publisher.clone(),
        alarms: AlarmService::new(stores, publisher, history_limit),
        alarm_id,
    }
}

fn duty() -> Principal {
    Principal::new("user-duty", Role::Duty)
}

async fn history_len(store: &InMemoryStore) -> usize {
    store
        .list_history(AlarmHistoryFilter::default())
        .await
        .expect("history")
        .len()
}

async fn building_status(store: &InMemoryStore) -> BuildingStatus {
    store
        .find_building("b-1")
        .await
        .expect("find")
        .expect("building")
        .status
}

#[tokio::test]
async fn alarm_transition_escalates_and_notifies_once() {
    let fixture = fixture().await;
    let updated = fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("update");
    assert_eq!(updated.status, AlarmStatus::Alarm);

    assert_eq!(history_len(&fixture.store).await, 1);
    assert_eq!(building_status(&fixture.store).await, BuildingStatus::Fire);
    let floor = fixture
        .store
        .find_floor("f-1")
        .await
        .expect("find")
        .expect("floor");
    assert_eq!(floor.status, BuildingStatus::Fire);

    let sent = fixture.publisher.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, EventKind::AlarmTriggered);
    assert!(sent[0].targets(&Topic::Role(Role::Dispatcher)));
    assert!(sent[0].targets(&Topic::Role(Role::Admin)));
    assert!(sent[0].targets(&Topic::Building("b-1".to_string())));
    assert_eq!(
        sent[0].payload,
        json!({
            "alarmId": fixture.alarm_id,
            "buildingId": "b-1",
            "floorId": "f-1",
            "status": "alarm",
        })
    );
}

#[tokio::test]
async fn same_status_refreshes_without_history_or_event() {
    let fixture = fixture().await;
    let before = fixture.alarms.get(&fixture.alarm_id).await.expect("alarm");
    let updated = fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "normal")
        .await
        .expect("update");
    assert_eq!(updated.status, AlarmStatus::Normal);
    assert!(updated.last_updated_ms >= before.last_updated_ms);
    assert_eq!(history_len(&fixture.store).await, 0);

    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("alarm");
    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("alarm again");
    assert_eq!(history_len(&fixture.store).await, 1);
    assert_eq!(fixture.publisher.events(), vec![EventKind::AlarmTriggered]);
}

#[tokio::test]
async fn non_alarm_statuses_never_touch_the_building() {
    let fixture = fixture().await;
    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "fault")
        .await
        .expect("fault");
    assert_eq!(building_status(&fixture.store).await, BuildingStatus::Normal);

    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("alarm");
    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "normal")
        .await
        .expect("normal");
    assert_eq!(building_status(&fixture.store).await, BuildingStatus::Fire);
    assert_eq!(history_len(&fixture.store).await, 3);
}

#[tokio::test]
async fn invalid_status_and_missing_alarm_are_rejected() {
    let fixture = fixture().await;
    let err = fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "burning")
        .await
        .expect_err("invalid");
    assert!(matches!(err, WorkflowError::InvalidStatus(_)));

    let err = fixture
        .alarms
        .update_status(&duty(), "missing", "alarm")
        .await
        .expect_err("missing");
    assert!(matches!(err, WorkflowError::NotFound("alarm")));
    assert_eq!(history_len(&fixture.store).await, 0);
}

#[tokio::test]
async fn resolve_is_single_shot_and_resets_live_alarm() {
    let fixture = fixture().await;
    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("alarm");
    let history = fixture
        .alarms
        .building_history("b-1", HistoryQuery::default())
        .await
        .expect("history");
    let history_id = history[0].history_id.clone();

    let resolver = Principal::new("user-dispatch", Role::Dispatcher);
    let resolved = fixture
        .alarms
        .resolve(&resolver, &history_id)
        .await
        .expect("resolve");
    assert_eq!(resolved.resolved_by.as_deref(), Some("user-dispatch"));
    let first_resolved_at = resolved.resolved_at_ms;
    assert!(first_resolved_at.is_some());

    let alarm = fixture.alarms.get(&fixture.alarm_id).await.expect("alarm");
    assert_eq!(alarm.status, AlarmStatus::Normal);
    assert_eq!(history_len(&fixture.store).await, 1);

    let err = fixture
        .alarms
        .resolve(&duty(), &history_id)
        .await
        .expect_err("second resolve");
    assert!(matches!(err, WorkflowError::Conflict(_)));
    let record = fixture
        .store
        .find_history(&history_id)
        .await
        .expect("find")
        .expect("record");
    assert_eq!(record.resolved_by.as_deref(), Some("user-dispatch"));
    assert_eq!(record.resolved_at_ms, first_resolved_at);

    let err = fixture
        .alarms
        .resolve(&duty(), "missing")
        .await
        .expect_err("missing");
    assert!(matches!(err, WorkflowError::NotFound(_)));
}

#[tokio::test]
async fn history_queries_filter_and_cap() {
    let fixture = fixture_with_limit(2).await;
    for status in ["alarm", "normal", "fault"] {
        fixture
            .alarms
            .update_status(&duty(), &fixture.alarm_id, status)
            .await
            .expect("update");
    }

    let alarms_only = fixture
        .alarms
        .building_history(
            "b-1",
            HistoryQuery {
                status: Some("alarm".to_string()),
                ..HistoryQuery::default()
            },
        )
        .await
        .expect("history");
    assert_eq!(alarms_only.len(), 1);

    let err = fixture
        .alarms
        .building_history(
            "b-1",
            HistoryQuery {
                status: Some("melted".to_string()),
                ..HistoryQuery::default()
            },
        )
        .await
        .expect_err("bad status");
    assert!(matches!(err, WorkflowError::InvalidStatus(_)));

    let dispatcher = Principal::new("user-dispatch", Role::Dispatcher);
    let global = fixture
        .alarms
        .global_history(&dispatcher, None)
        .await
        .expect("global");
    assert_eq!(global.len(), 2);

    let err = fixture
        .alarms
        .global_history(&duty(), None)
        .await
        .expect_err("duty");
    assert!(matches!(err, WorkflowError::Forbidden));
}

#[tokio::test]
async fn active_alarms_lists_only_alarming_sensors() {
    let fixture = fixture().await;
    assert!(fixture.alarms.list_active().await.expect("active").is_empty());
    fixture
        .alarms
        .update_status(&duty(), &fixture.alarm_id, "alarm")
        .await
        .expect("alarm");
    let active = fixture.alarms.list_active().await.expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].alarm_id, fixture.alarm_id);
    assert_eq!(fixture.alarms.list_by_floor("f-1").await.expect("floor").len(), 1);
}
