use fire_auth::{check_password_policy, hash_password, verify_password_and_maybe_upgrade};

#[test]
fn argon2_hash_verifies() {
    let hash = hash_password("admin123").expect("hash");
    let check = verify_password_and_maybe_upgrade(&hash, "admin123").expect("check");
    assert!(check.verified);
    assert!(check.upgrade_hash.is_none());

    let check = verify_password_and_maybe_upgrade(&hash, "admin124").expect("check");
    assert!(!check.verified);
}

#[test]
fn legacy_plaintext_upgrades() {
    let check = verify_password_and_maybe_upgrade("admin123", "admin123").expect("check");
    assert!(check.verified);
    assert!(
        check
            .upgrade_hash
            .as_deref()
            .unwrap_or_default()
            .starts_with("$argon2")
    );
}

#[test]
fn wrong_plaintext_rejected() {
    let check = verify_password_and_maybe_upgrade("admin123", "bad").expect("check");
    assert!(!check.verified);
    assert!(check.upgrade_hash.is_none());
}

#[test]
fn short_passwords_fail_policy() {
    assert!(check_password_policy("12345").is_err());
    assert!(check_password_policy("123456").is_ok());
}
