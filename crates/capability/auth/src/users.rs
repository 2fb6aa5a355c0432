//! 用户管理（仅 admin）：列表、审批、部分更新、删除。

use crate::{
    AuthError, AuthService, check_password_policy, hash_password, parse_role, require_text,
    validate_email,
};
use fire_storage::{UserRecord, UserUpdate};
use tracing::info;

/// 管理员对用户的部分更新；口令为明文，落库前哈希。
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub password: Option<String>,
}

impl AuthService {
    /// 列出用户；`pending_only` 时只返回待审批账户。
    pub async fn list_users(&self, pending_only: bool) -> Result<Vec<UserRecord>, AuthError> {
        let filter = pending_only.then_some(false);
        Ok(self.user_store.list_users(filter).await?)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.user_store
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn approve_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        let update = UserUpdate {
            is_approved: Some(true),
            ..UserUpdate::default()
        };
        let user = self
            .user_store
            .update_user(user_id, update)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        info!(target: "fire.auth", user_id = %user.user_id, "user_approved");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        changes: UserChanges,
    ) -> Result<UserRecord, AuthError> {
        if let Some(username) = &changes.username {
            require_text(username, "username")?;
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(first_name) = &changes.first_name {
            require_text(first_name, "firstName")?;
        }
        if let Some(last_name) = &changes.last_name {
            require_text(last_name, "lastName")?;
        }
        let role = changes.role.as_deref().map(parse_role).transpose()?;
        let password = match changes.password.as_deref() {
            Some(password) => {
                check_password_policy(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let update = UserUpdate {
            username: changes.username.map(|username| username.trim().to_string()),
            email: changes.email.map(|email| email.trim().to_string()),
            first_name: changes.first_name.map(|name| name.trim().to_string()),
            last_name: changes.last_name.map(|name| name.trim().to_string()),
            phone: changes.phone,
            role,
            is_active: changes.is_active,
            is_approved: changes.is_approved,
            password,
        };
        let user = self
            .user_store
            .update_user(user_id, update)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        info!(target: "fire.auth", user_id = %user.user_id, role = %user.role, "user_updated");
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        if !self.user_store.delete_user(user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(target: "fire.auth", user_id = %user_id, "user_deleted");
        Ok(())
    }
}
