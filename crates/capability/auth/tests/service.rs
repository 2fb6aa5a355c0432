use std::sync::Arc;

use domain::Role;
use fire_auth::{AuthError, AuthService, JwtManager, Registration, UserChanges, require_role};
use fire_storage::InMemoryStore;

fn service() -> AuthService {
    let store = Arc::new(InMemoryStore::with_default_admin());
    let jwt = JwtManager::new("secret".to_string(), 3600, 7200);
    AuthService::new(store, jwt)
}

fn registration(username: &str, email: &str, role: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        first_name: "Dana".to_string(),
        last_name: "Lee".to_string(),
        phone: None,
        role: role.to_string(),
    }
}

#[tokio::test]
async fn refresh_token_is_single_use_after_rotation() {
    let auth = service();

    let (_, tokens1) = auth
        .login("admin@fire.local", "admin123")
        .await
        .expect("login");
    let tokens2 = auth
        .refresh(&tokens1.refresh_token)
        .await
        .expect("refresh");
    assert_ne!(tokens1.refresh_token, tokens2.refresh_token);

    let result = auth.refresh(&tokens1.refresh_token).await;
    assert!(matches!(result, Err(AuthError::TokenInvalid)));
}

#[tokio::test]
async fn non_admin_registration_awaits_approval() {
    let auth = service();
    let user = auth
        .register(registration("duty1", "duty1@example.com", "duty"))
        .await
        .expect("register");
    assert_eq!(user.role, Role::Duty);
    assert!(!user.is_approved);
    assert!(user.password.starts_with("$argon2"));

    let result = auth.login("duty1@example.com", "secret1").await;
    assert!(matches!(result, Err(AuthError::AccountUnapproved)));

    auth.approve_user(&user.user_id).await.expect("approve");
    let (logged_in, _) = auth
        .login("duty1@example.com", "secret1")
        .await
        .expect("login");
    assert_eq!(logged_in.user_id, user.user_id);
}

#[tokio::test]
async fn admin_registration_is_approved_immediately() {
    let auth = service();
    let user = auth
        .register(registration("root2", "root2@example.com", "admin"))
        .await
        .expect("register");
    assert!(user.is_approved);
    assert!(user.is_active);
}

#[tokio::test]
async fn registration_validates_input() {
    let auth = service();

    assert!(matches!(
        auth.register(registration("u1", "not-an-email", "duty")).await,
        Err(AuthError::Validation(_))
    ));

    assert!(matches!(
        auth.register(registration("u2", "u2@example.com", "chief")).await,
        Err(AuthError::Validation(_))
    ));

    let mut short = registration("u3", "u3@example.com", "duty");
    short.password = "123".to_string();
    assert!(matches!(
        auth.register(short).await,
        Err(AuthError::Validation(_))
    ));

    assert!(matches!(
        auth.register(registration("admin", "x@example.com", "duty")).await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let auth = service();
    assert!(matches!(
        auth.login("admin@fire.local", "nope").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("ghost@fire.local", "admin123").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn gate_rejects_deactivated_accounts() {
    let auth = service();
    let user = auth
        .register(registration("ff1", "ff1@example.com", "firefighter"))
        .await
        .expect("register");
    auth.approve_user(&user.user_id).await.expect("approve");
    let (_, tokens) = auth.login("ff1@example.com", "secret1").await.expect("login");

    let principal = auth
        .authenticate(&tokens.access_token)
        .await
        .expect("authenticate");
    assert_eq!(principal.role, Role::Firefighter);

    auth.update_user(
        &user.user_id,
        UserChanges {
            is_active: Some(false),
            ..UserChanges::default()
        },
    )
    .await
    .expect("deactivate");
    assert!(matches!(
        auth.authenticate(&tokens.access_token).await,
        Err(AuthError::AccountInactive)
    ));

    assert!(matches!(
        auth.authenticate("garbage").await,
        Err(AuthError::Unauthenticated)
    ));
}

#[tokio::test]
async fn gate_uses_current_role_from_store() {
    let auth = service();
    let user = auth
        .register(registration("d1", "d1@example.com", "duty"))
        .await
        .expect("register");
    auth.approve_user(&user.user_id).await.expect("approve");
    let (_, tokens) = auth.login("d1@example.com", "secret1").await.expect("login");

    auth.update_user(
        &user.user_id,
        UserChanges {
            role: Some("dispatcher".to_string()),
            ..UserChanges::default()
        },
    )
    .await
    .expect("promote");
    let principal = auth
        .authenticate(&tokens.access_token)
        .await
        .expect("authenticate");
    assert_eq!(principal.role, Role::Dispatcher);
    assert!(require_role(&principal, &[Role::Dispatcher]).is_ok());
    assert!(matches!(
        require_role(&principal, &[Role::Admin]),
        Err(AuthError::Forbidden)
    ));
}

#[tokio::test]
async fn admin_user_management() {
    let auth = service();
    let user = auth
        .register(registration("d1", "d1@example.com", "duty"))
        .await
        .expect("register");

    let pending = auth.list_users(true).await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, user.user_id);
    assert_eq!(auth.list_users(false).await.expect("all").len(), 2);

    let updated = auth
        .update_user(
            &user.user_id,
            UserChanges {
                password: Some("newsecret".to_string()),
                is_approved: Some(true),
                ..UserChanges::default()
            },
        )
        .await
        .expect("update");
    assert!(updated.password.starts_with("$argon2"));
    auth.login("d1@example.com", "newsecret")
        .await
        .expect("login with new password");

    auth.delete_user(&user.user_id).await.expect("delete");
    assert!(matches!(
        auth.get_user(&user.user_id).await,
        Err(AuthError::UserNotFound)
    ));
    assert!(matches!(
        auth.delete_user(&user.user_id).await,
        Err(AuthError::UserNotFound)
    ));
}
