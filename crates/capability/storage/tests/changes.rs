use domain::{
    AlarmDraft, AlarmPatch, BuildingPatch, BuildingStatus, ChangeMutation, ChangeStatus,
    ChangeTarget, Coordinates, FloorPatch,
};
use fire_storage::{
    AlarmStore, AppliedChange, ApplyOutcome, ApproveOutcome, BuildingRecord, BuildingStore,
    ChangeReview, ChangeStore, FloorRecord, FloorStore, InMemoryStore, PendingChangeRecord,
};

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    for (building_id, address) in [("b-1", "1 Main St"), ("b-2", "2 Main St")] {
        store
            .create_building(BuildingRecord {
                building_id: building_id.to_string(),
                name: format!("Building {building_id}"),
                address: address.to_string(),
                floors: 2,
                status: BuildingStatus::Normal,
                created_by: "user-admin".to_string(),
                duty_officers: Vec::new(),
                created_at_ms: 1_000,
                updated_at_ms: 1_000,
            })
            .await
            .expect("building");
    }
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
    store
}

fn add_alarm_target() -> ChangeTarget {
    ChangeTarget {
        building_id: "b-1".to_string(),
        floor_id: Some("f-1".to_string()),
        alarm_id: None,
    }
}

fn add_alarm_mutation() -> ChangeMutation {
    ChangeMutation::AlarmAdd(AlarmDraft {
        name: "Lobby detector".to_string(),
        kind: "smoke".to_string(),
        coordinates: Coordinates { x: 10.0, y: 20.0 },
    })
}

fn pending(change_id: &str, target: ChangeTarget, mutation: ChangeMutation, at_ms: i64) -> PendingChangeRecord {
    PendingChangeRecord {
        change_id: change_id.to_string(),
        target,
        mutation,
        requested_by: "user-duty".to_string(),
        requested_at_ms: at_ms,
        status: ChangeStatus::Pending,
        reviewed_by: None,
        reviewed_at_ms: None,
        rejection_reason: None,
    }
}

fn review(at_ms: i64) -> ChangeReview {
    ChangeReview {
        reviewer: "user-admin".to_string(),
        reviewed_at_ms: at_ms,
    }
}

#[tokio::test]
async fn approve_replays_mutation_and_marks_approved() {
    let store = seeded_store().await;
    store
        .create_change(pending("c-1", add_alarm_target(), add_alarm_mutation(), 2_000))
        .await
        .expect("create");
    assert!(
        store
            .list_alarms_by_floor("f-1")
            .await
            .expect("alarms")
            .is_empty()
    );

    let outcome = store.approve_change("c-1", review(3_000)).await.expect("approve");
    let ApproveOutcome::Approved { change, applied } = outcome else {
        panic!("expected approval");
    };
    assert_eq!(change.status, ChangeStatus::Approved);
    assert_eq!(change.reviewed_by.as_deref(), Some("user-admin"));
    assert_eq!(change.reviewed_at_ms, Some(3_000));
    let AppliedChange::AlarmCreated(alarm) = applied else {
        panic!("expected created alarm");
    };
    assert_eq!(alarm.floor_id, "f-1");
    assert_eq!(alarm.building_id, "b-1");

    let alarms = store.list_alarms_by_floor("f-1").await.expect("alarms");
    assert_eq!(alarms.len(), 1);
}

#[tokio::test]
async fn terminal_changes_cannot_be_reviewed_again() {
    let store = seeded_store().await;
    store
        .create_change(pending("c-1", add_alarm_target(), add_alarm_mutation(), 2_000))
        .await
        .expect("create");
    store.approve_change("c-1", review(3_000)).await.expect("approve");

    let again = store.approve_change("c-1", review(4_000)).await.expect("approve");
    assert!(matches!(
        again,
        ApproveOutcome::AlreadyReviewed(ChangeStatus::Approved)
    ));
    let rejected = store
        .reject_change("c-1", review(4_000), Some("late".to_string()))
        .await
        .expect("reject");
    assert!(rejected.is_none());

    // 只新增了一次
    let alarms = store.list_alarms_by_floor("f-1").await.expect("alarms");
    assert_eq!(alarms.len(), 1);

    let missing = store.approve_change("c-404", review(4_000)).await.expect("approve");
    assert!(matches!(missing, ApproveOutcome::NotFound));
}

#[tokio::test]
async fn reject_records_reason_and_applies_nothing() {
    let store = seeded_store().await;
    store
        .create_change(pending("c-1", add_alarm_target(), add_alarm_mutation(), 2_000))
        .await
        .expect("create");

    let change = store
        .reject_change("c-1", review(3_000), Some("wrong floor".to_string()))
        .await
        .expect("reject")
        .expect("rejected");
    assert_eq!(change.status, ChangeStatus::Rejected);
    assert_eq!(change.rejection_reason.as_deref(), Some("wrong floor"));

    assert!(
        store
            .list_alarms_by_floor("f-1")
            .await
            .expect("alarms")
            .is_empty()
    );
    let outcome = store.approve_change("c-1", review(4_000)).await.expect("approve");
    assert!(matches!(
        outcome,
        ApproveOutcome::AlreadyReviewed(ChangeStatus::Rejected)
    ));
}

#[tokio::test]
async fn approve_with_missing_target_leaves_change_pending() {
    let store = seeded_store().await;
    let target = ChangeTarget {
        building_id: "b-1".to_string(),
        floor_id: Some("f-1".to_string()),
        alarm_id: Some("a-404".to_string()),
    };
    store
        .create_change(pending(
            "c-1",
            target,
            ChangeMutation::AlarmUpdate(AlarmPatch {
                name: Some("Renamed".to_string()),
                ..AlarmPatch::default()
            }),
            2_000,
        ))
        .await
        .expect("create");

    let outcome = store.approve_change("c-1", review(3_000)).await.expect("approve");
    assert!(matches!(outcome, ApproveOutcome::TargetMissing("alarm")));
    let change = store.find_change("c-1").await.expect("find").expect("c-1");
    assert_eq!(change.status, ChangeStatus::Pending);
    assert!(change.reviewed_by.is_none());
}

#[tokio::test]
async fn floor_of_other_building_is_missing_target() {
    let store = seeded_store().await;
    let outcome = store
        .apply_change(
            &ChangeTarget {
                building_id: "b-2".to_string(),
                floor_id: Some("f-1".to_string()),
                alarm_id: None,
            },
            &add_alarm_mutation(),
            2_000,
        )
        .await
        .expect("apply");
    assert!(matches!(outcome, ApplyOutcome::TargetMissing("floor")));
    assert!(
        store
            .list_alarms_by_building("b-2")
            .await
            .expect("alarms")
            .is_empty()
    );
}

#[tokio::test]
async fn building_and_floor_updates_apply_partially() {
    let store = seeded_store().await;
    let outcome = store
        .apply_change(
            &ChangeTarget {
                building_id: "b-1".to_string(),
                ..ChangeTarget::default()
            },
            &ChangeMutation::BuildingUpdate(BuildingPatch {
                name: Some("Renamed".to_string()),
                ..BuildingPatch::default()
            }),
            5_000,
        )
        .await
        .expect("apply");
    let ApplyOutcome::Applied(AppliedChange::BuildingUpdated(building)) = outcome else {
        panic!("expected building update");
    };
    assert_eq!(building.name, "Renamed");
    assert_eq!(building.address, "1 Main St");
    assert_eq!(building.updated_at_ms, 5_000);

    let err = store
        .apply_change(
            &ChangeTarget {
                building_id: "b-1".to_string(),
                ..ChangeTarget::default()
            },
            &ChangeMutation::BuildingUpdate(BuildingPatch {
                address: Some("2 Main St".to_string()),
                ..BuildingPatch::default()
            }),
            6_000,
        )
        .await
        .expect_err("address taken");
    assert!(err.is_conflict());

    let outcome = store
        .apply_change(
            &ChangeTarget {
                building_id: "b-1".to_string(),
                floor_id: Some("f-1".to_string()),
                alarm_id: None,
            },
            &ChangeMutation::FloorUpdate(FloorPatch {
                plan_image_path: Some("/plans/new.png".to_string()),
                status: None,
            }),
            7_000,
        )
        .await
        .expect("apply");
    let ApplyOutcome::Applied(AppliedChange::FloorUpdated(floor)) = outcome else {
        panic!("expected floor update");
    };
    assert_eq!(floor.plan_image_path, "/plans/new.png");
    assert_eq!(floor.status, BuildingStatus::Normal);
}

#[tokio::test]
async fn list_changes_filters_and_orders_newest_first() {
    let store = seeded_store().await;
    for (change_id, at_ms) in [("c-1", 1_000), ("c-2", 3_000), ("c-3", 2_000)] {
        store
            .create_change(pending(change_id, add_alarm_target(), add_alarm_mutation(), at_ms))
            .await
            .expect("create");
    }
    store
        .reject_change("c-3", review(4_000), None)
        .await
        .expect("reject");

    let all = store.list_changes(None).await.expect("list");
    let ids: Vec<&str> = all.iter().map(|change| change.change_id.as_str()).collect();
    assert_eq!(ids, vec!["c-2", "c-3", "c-1"]);

    let pending_only = store
        .list_changes(Some(ChangeStatus::Pending))
        .await
        .expect("list");
    assert_eq!(pending_only.len(), 2);
}
