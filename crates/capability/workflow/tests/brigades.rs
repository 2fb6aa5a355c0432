use domain::{BrigadeStatus, BuildingStatus, Principal, Role};
use fire_notify::{EventKind, MemoryPublisher, Topic};
use fire_storage::{
    BrigadeAssignment, BrigadeUpdate, BuildingRecord, BuildingStore, InMemoryStore, UserRecord,
    UserStore,
};
use fire_workflow::{BrigadeDraft, BrigadeService, Stores, WorkflowError};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    publisher: Arc<MemoryPublisher>,
    brigades: BrigadeService,
    brigade_id: String,
}

fn user(user_id: &str, role: Role) -> UserRecord {
    UserRecord {
        user_id: user_id.to_string(),
        username: user_id.to_string(),
        email: format!("{user_id}@fire.local"),
        password: "secret1".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        role,
        is_approved: true,
        is_active: true,
        created_at_ms: 1_000,
    }
}

fn building(building_id: &str, address: &str, status: BuildingStatus) -> BuildingRecord {
    BuildingRecord {
        building_id: building_id.to_string(),
        name: format!("Site {building_id}"),
        address: address.to_string(),
        floors: 1,
        status,
        created_by: "user-admin".to_string(),
        duty_officers: Vec::new(),
        created_at_ms: 1_000,
        updated_at_ms: 1_000,
    }
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    for record in [
        user("ff-1", Role::Firefighter),
        user("ff-2", Role::Firefighter),
        user("duty-1", Role::Duty),
    ] {
        store.create_user(record).await.expect("user");
    }
    store
        .create_building(building("b-fire", "1 Ember Ln", BuildingStatus::Fire))
        .await
        .expect("building");
    store
        .create_building(building("b-calm", "2 Ember Ln", BuildingStatus::Normal))
        .await
        .expect("building");

    let publisher = Arc::new(MemoryPublisher::new());
    let brigades = BrigadeService::new(Stores::from_backend(store), publisher.clone());
    let brigade = brigades
        .create(
            &admin(),
            BrigadeDraft {
                name: "Engine 7".to_string(),
                members: vec!["ff-1".to_string()],
            },
        )
        .await
        .expect("brigade");
    Fixture {
        publisher,
        brigades,
        brigade_id: brigade.brigade_id,
    }
}

fn admin() -> Principal {
    Principal::new("user-admin", Role::Admin)
}

fn dispatcher() -> Principal {
    Principal::new("user-dispatch", Role::Dispatcher)
}

#[tokio::test]
async fn assign_requires_available_brigade_and_burning_building() {
    let fixture = fixture().await;
    let err = fixture
        .brigades
        .assign(&dispatcher(), &fixture.brigade_id, "b-calm")
        .await
        .expect_err("no fire");
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

    let assigned = fixture
        .brigades
        .assign(&dispatcher(), &fixture.brigade_id, "b-fire")
        .await
        .expect("assign");
    assert!(!assigned.is_available);
    assert_eq!(assigned.assignment.status, BrigadeStatus::EnRoute);
    assert_eq!(assigned.assignment.building_id.as_deref(), Some("b-fire"));
    assert_eq!(assigned.assignment.assigned_by.as_deref(), Some("user-dispatch"));

    let err = fixture
        .brigades
        .assign(&dispatcher(), &fixture.brigade_id, "b-fire")
        .await
        .expect_err("already assigned");
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

    let sent = fixture.publisher.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, EventKind::BrigadeAssigned);
    assert!(sent[0].targets(&Topic::Brigade(fixture.brigade_id.clone())));
    assert!(sent[0].targets(&Topic::Role(Role::Dispatcher)));
    assert_eq!(
        sent[0].payload,
        json!({ "brigadeId": fixture.brigade_id, "buildingId": "b-fire", "status": "en-route" })
    );
}

#[tokio::test]
async fn only_dispatchers_assign() {
    let fixture = fixture().await;
    let err = fixture
        .brigades
        .assign(&admin(), &fixture.brigade_id, "b-fire")
        .await
        .expect_err("admin");
    assert!(matches!(err, WorkflowError::Forbidden));
    let err = fixture
        .brigades
        .assign(&dispatcher(), "missing", "b-fire")
        .await
        .expect_err("missing");
    assert!(matches!(err, WorkflowError::NotFound("brigade")));
}

#[tokio::test]
async fn available_status_clears_assignment() {
    let fixture = fixture().await;
    fixture
        .brigades
        .assign(&dispatcher(), &fixture.brigade_id, "b-fire")
        .await
        .expect("assign");
    let member = Principal::new("ff-1", Role::Firefighter);
    let on_site = fixture
        .brigades
        .update_status(&member, &fixture.brigade_id, "on-site")
        .await
        .expect("on-site");
    assert_eq!(on_site.assignment.status, BrigadeStatus::OnSite);
    assert!(!on_site.is_available);
    let last = fixture.publisher.notifications().pop().expect("event");
    assert_eq!(
        last.payload,
        json!({ "brigadeId": fixture.brigade_id, "buildingId": "b-fire", "status": "on-site" })
    );

    let released = fixture
        .brigades
        .update_status(&member, &fixture.brigade_id, "available")
        .await
        .expect("available");
    assert!(released.is_available);
    assert_eq!(released.assignment, BrigadeAssignment::default());

    let last = fixture.publisher.notifications().pop().expect("event");
    assert_eq!(last.event, EventKind::BrigadeStatusUpdated);
    assert_eq!(
        last.payload,
        json!({ "brigadeId": fixture.brigade_id, "buildingId": null, "status": "available" })
    );

    let again = fixture
        .brigades
        .update_status(&dispatcher(), &fixture.brigade_id, "available")
        .await
        .expect("available again");
    assert!(again.is_available);
}

#[tokio::test]
async fn status_update_checks_membership_and_assignment() {
    let fixture = fixture().await;
    let outsider = Principal::new("ff-2", Role::Firefighter);
    let err = fixture
        .brigades
        .update_status(&outsider, &fixture.brigade_id, "on-site")
        .await
        .expect_err("outsider");
    assert!(matches!(err, WorkflowError::Forbidden));

    let err = fixture
        .brigades
        .update_status(&dispatcher(), &fixture.brigade_id, "returning")
        .await
        .expect_err("unassigned");
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

    let err = fixture
        .brigades
        .update_status(&dispatcher(), &fixture.brigade_id, "parked")
        .await
        .expect_err("invalid");
    assert!(matches!(err, WorkflowError::InvalidStatus(_)));
    assert!(fixture.publisher.notifications().is_empty());
}

#[tokio::test]
async fn members_must_be_existing_firefighters() {
    let fixture = fixture().await;
    let err = fixture
        .brigades
        .create(
            &admin(),
            BrigadeDraft {
                name: "Ladder 2".to_string(),
                members: vec!["duty-1".to_string()],
            },
        )
        .await
        .expect_err("duty member");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = fixture
        .brigades
        .update(
            &admin(),
            &fixture.brigade_id,
            BrigadeUpdate {
                members: Some(vec!["ghost".to_string()]),
                ..BrigadeUpdate::default()
            },
        )
        .await
        .expect_err("unknown member");
    assert!(matches!(err, WorkflowError::Validation(_)));

    let err = fixture
        .brigades
        .create(
            &admin(),
            BrigadeDraft {
                name: "Engine 7".to_string(),
                members: Vec::new(),
            },
        )
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, WorkflowError::Conflict(_)));

    let updated = fixture
        .brigades
        .update(
            &admin(),
            &fixture.brigade_id,
            BrigadeUpdate {
                members: Some(vec!["ff-1".to_string(), "ff-2".to_string()]),
                ..BrigadeUpdate::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.members.len(), 2);
}

#[tokio::test]
async fn assigned_brigade_cannot_be_deleted() {
    let fixture = fixture().await;
    fixture
        .brigades
        .assign(&dispatcher(), &fixture.brigade_id, "b-fire")
        .await
        .expect("assign");
    let err = fixture
        .brigades
        .delete(&admin(), &fixture.brigade_id)
        .await
        .expect_err("assigned");
    assert!(matches!(err, WorkflowError::PreconditionFailed(_)));

    fixture
        .brigades
        .update_status(&dispatcher(), &fixture.brigade_id, "available")
        .await
        .expect("release");
    fixture
        .brigades
        .delete(&admin(), &fixture.brigade_id)
        .await
        .expect("delete");
    let err = fixture
        .brigades
        .get(&admin(), &fixture.brigade_id)
        .await
        .expect_err("gone");
    assert!(matches!(err, WorkflowError::NotFound("brigade")));
}

#[tokio::test]
async fn read_access_follows_role_sets() {
    let fixture = fixture().await;
    let firefighter = Principal::new("ff-1", Role::Firefighter);
    assert!(matches!(
        fixture.brigades.list(&firefighter).await,
        Err(WorkflowError::Forbidden)
    ));
    assert!(matches!(
        fixture.brigades.available(&admin()).await,
        Err(WorkflowError::Forbidden)
    ));
    let available = fixture.brigades.available(&dispatcher()).await.expect("available");
    assert_eq!(available.len(), 1);
    assert_eq!(fixture.brigades.list(&admin()).await.expect("list").len(), 1);
}

#[tokio::test]
async fn membership_guard_names_the_brigade() {
    let fixture = fixture().await;
    let err = fixture
        .brigades
        .ensure_not_member("ff-1")
        .await
        .expect_err("member");
    assert!(matches!(err, WorkflowError::PreconditionFailed(message) if message.contains("Engine 7")));
    fixture
        .brigades
        .ensure_not_member("ff-2")
        .await
        .expect("not a member");
}
