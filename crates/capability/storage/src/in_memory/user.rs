//! 用户内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::{UserRecord, UserUpdate};
use crate::traits::UserStore;

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, record: UserRecord) -> Result<UserRecord, StorageError> {
        let mut state = self.write()?;
        let duplicate = state.users.values().any(|user| {
            user.username == record.username || user.email.eq_ignore_ascii_case(&record.email)
        });
        if duplicate {
            return Err(StorageError::conflict("username or email already registered"));
        }
        state.users.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    async fn list_users(&self, approved: Option<bool>) -> Result<Vec<UserRecord>, StorageError> {
        let state = self.read()?;
        let mut users: Vec<UserRecord> = state
            .users
            .values()
            .filter(|user| approved.is_none_or(|flag| user.is_approved == flag))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
        Ok(users)
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<Option<UserRecord>, StorageError> {
        let mut state = self.write()?;
        let duplicate = state.users.values().any(|user| {
            user.user_id != user_id
                && (update.username.as_deref() == Some(user.username.as_str())
                    || update
                        .email
                        .as_deref()
                        .is_some_and(|email| user.email.eq_ignore_ascii_case(email)))
        });
        if duplicate {
            return Err(StorageError::conflict("username or email already registered"));
        }
        let Some(user) = state.users.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(is_approved) = update.is_approved {
            user.is_approved = is_approved;
        }
        if let Some(password) = update.password {
            user.password = password;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        state.refresh_jtis.remove(user_id);
        Ok(state.users.remove(user_id).is_some())
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        match state.users.get_mut(user_id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_refresh_jti(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read()?.refresh_jtis.get(user_id).cloned())
    }

    async fn set_refresh_jti(
        &self,
        user_id: &str,
        jti: Option<&str>,
    ) -> Result<bool, StorageError> {
        let mut state = self.write()?;
        if !state.users.contains_key(user_id) {
            return Ok(false);
        }
        match jti {
            Some(jti) => {
                state
                    .refresh_jtis
                    .insert(user_id.to_string(), jti.to_string());
            }
            None => {
                state.refresh_jtis.remove(user_id);
            }
        }
        Ok(true)
    }
}
