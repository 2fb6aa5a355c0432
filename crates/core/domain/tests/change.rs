use domain::{
    AlarmDraft, AlarmPatch, BuildingPatch, ChangeAction, ChangeError, ChangeMutation, ChangeTarget,
    ChangeType, Coordinates, FloorPatch,
};
use serde_json::json;

fn alarm_target() -> ChangeTarget {
    ChangeTarget {
        building_id: "building-1".to_string(),
        floor_id: Some("floor-1".to_string()),
        alarm_id: Some("alarm-1".to_string()),
    }
}

#[test]
fn alarm_add_encodes_action_and_data() {
    let mutation = ChangeMutation::AlarmAdd(AlarmDraft {
        name: "Lobby smoke".to_string(),
        kind: "smoke".to_string(),
        coordinates: Coordinates { x: 10.0, y: 20.5 },
    });
    assert_eq!(mutation.change_type(), ChangeType::AlarmPosition);
    assert_eq!(mutation.action(), ChangeAction::Add);

    let changes = mutation.to_changes().expect("encode");
    assert_eq!(changes["action"], "add");
    assert_eq!(changes["data"]["type"], "smoke");
    assert_eq!(changes["data"]["coordinates"]["y"], 20.5);

    let decoded = ChangeMutation::from_changes(ChangeType::AlarmPosition, &changes).expect("decode");
    assert_eq!(decoded, mutation);
}

#[test]
fn delete_decodes_without_data() {
    let changes = json!({ "action": "delete" });
    let decoded = ChangeMutation::from_changes(ChangeType::AlarmPosition, &changes).expect("decode");
    assert_eq!(decoded, ChangeMutation::AlarmDelete);
}

#[test]
fn unsupported_combination_is_rejected() {
    let changes = json!({ "action": "add", "data": { "name": "B" } });
    let err = ChangeMutation::from_changes(ChangeType::BuildingPlan, &changes).expect_err("reject");
    assert!(matches!(err, ChangeError::Payload(_)));

    let changes = json!({ "action": "rename", "data": {} });
    assert!(ChangeMutation::from_changes(ChangeType::FloorPlan, &changes).is_err());
}

#[test]
fn malformed_data_fails_at_decode() {
    let changes = json!({ "action": "add", "data": { "name": "x" } });
    assert!(ChangeMutation::from_changes(ChangeType::AlarmPosition, &changes).is_err());
}

#[test]
fn validate_requires_target_ids() {
    let mut target = alarm_target();
    target.alarm_id = None;
    let err = ChangeMutation::AlarmDelete.validate(&target).expect_err("alarm id");
    assert_eq!(err, ChangeError::Invalid("alarmId required".to_string()));

    let mut target = alarm_target();
    target.floor_id = None;
    let mutation = ChangeMutation::FloorUpdate(FloorPatch {
        plan_image_path: Some("/uploads/f1.png".to_string()),
        status: None,
    });
    assert!(mutation.validate(&target).is_err());
}

#[test]
fn validate_rejects_empty_and_invalid_patches() {
    let target = alarm_target();
    assert!(
        ChangeMutation::AlarmUpdate(AlarmPatch::default())
            .validate(&target)
            .is_err()
    );
    let mutation = ChangeMutation::BuildingUpdate(BuildingPatch {
        floors: Some(0),
        ..BuildingPatch::default()
    });
    assert!(mutation.validate(&target).is_err());

    let mutation = ChangeMutation::AlarmAdd(AlarmDraft {
        name: "A".to_string(),
        kind: "heat".to_string(),
        coordinates: Coordinates { x: f64::NAN, y: 1.0 },
    });
    assert!(mutation.validate(&target).is_err());

    let mutation = ChangeMutation::BuildingUpdate(BuildingPatch {
        name: Some("Tower".to_string()),
        ..BuildingPatch::default()
    });
    assert!(mutation.validate(&target).is_ok());
}
