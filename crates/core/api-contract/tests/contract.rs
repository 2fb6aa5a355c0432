use api_contract::{
    AlarmDto, BrigadeDto, AssignmentDto, CoordinatesDto, CreateAlarmRequest, EditOutcomeDto,
    LoginRequest, PendingChangeDto, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
};
use serde_json::{Value, json};

#[test]
fn refresh_token_request_accepts_camel_case() {
    let payload = r#"{"refreshToken":"token-1"}"#;
    let req: RefreshTokenRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.refresh_token, "token-1");
}

#[test]
fn refresh_token_request_accepts_snake_case() {
    let payload = r#"{"refresh_token":"token-2"}"#;
    let req: RefreshTokenRequest = serde_json::from_str(payload).expect("parse");
    assert_eq!(req.refresh_token, "token-2");
}

#[test]
fn refresh_token_response_is_camel_case() {
    let response = RefreshTokenResponse {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires: 1_700_000_000_000,
    };
    let value = serde_json::to_value(response).expect("serialize");
    assert!(value.get("accessToken").is_some());
    assert!(value.get("refreshToken").is_some());
    assert!(value.get("access_token").is_none());
}

#[test]
fn register_and_login_requests_parse() {
    let payload = json!({
        "username": "duty1",
        "email": "duty1@example.com",
        "password": "secret1",
        "firstName": "Anna",
        "lastName": "Petrova",
        "role": "duty"
    });
    let req: RegisterRequest = serde_json::from_value(payload).expect("parse");
    assert_eq!(req.first_name, "Anna");
    assert!(req.phone.is_none());

    let req: LoginRequest =
        serde_json::from_str(r#"{"email":"a@b.c","password":"p"}"#).expect("parse");
    assert_eq!(req.email, "a@b.c");
}

#[test]
fn alarm_uses_type_key() {
    let req: CreateAlarmRequest = serde_json::from_value(json!({
        "buildingId": "b1",
        "floorId": "f1",
        "name": "Hall",
        "type": "smoke",
        "coordinates": { "x": 1.0, "y": 2.0 }
    }))
    .expect("parse");
    assert_eq!(req.kind, "smoke");

    let dto = AlarmDto {
        id: "a1".to_string(),
        building_id: "b1".to_string(),
        floor_id: "f1".to_string(),
        name: "Hall".to_string(),
        kind: "smoke".to_string(),
        status: "normal".to_string(),
        coordinates: CoordinatesDto { x: 1.0, y: 2.0 },
        last_updated: 1,
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert_eq!(value["type"], "smoke");
    assert_eq!(value["lastUpdated"], 1);
}

#[test]
fn brigade_assignment_serializes_nulls() {
    let dto = BrigadeDto {
        id: "br1".to_string(),
        name: "Unit 1".to_string(),
        members: vec![],
        is_available: true,
        current_assignment: AssignmentDto {
            building_id: None,
            assigned_at: None,
            assigned_by: None,
            status: "available".to_string(),
        },
    };
    let value = serde_json::to_value(dto).expect("serialize");
    assert_eq!(value["isAvailable"], true);
    assert_eq!(value["currentAssignment"]["buildingId"], Value::Null);
    assert_eq!(value["currentAssignment"]["status"], "available");
}

#[test]
fn deferred_edit_omits_entity() {
    let outcome: EditOutcomeDto<AlarmDto> = EditOutcomeDto {
        applied: false,
        entity: None,
        pending_change: Some(PendingChangeDto {
            id: "c1".to_string(),
            change_type: "alarm-position".to_string(),
            building_id: "b1".to_string(),
            floor_id: Some("f1".to_string()),
            alarm_id: None,
            changes: json!({ "action": "add", "data": {} }),
            requested_by: "u1".to_string(),
            requested_at: 1,
            status: "pending".to_string(),
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        }),
    };
    let value = serde_json::to_value(outcome).expect("serialize");
    assert_eq!(value["applied"], false);
    assert!(value.get("entity").is_none());
    assert_eq!(value["pendingChange"]["type"], "alarm-position");
}
