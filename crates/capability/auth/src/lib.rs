//! 认证能力：注册、登录、JWT 生成与校验，以及访问控制闸门。
//!
//! 闸门（`authenticate` + `require_role`）是所有业务操作之前的纯判定：
//! 解析 access token 得到用户 ID 后重新读取用户记录，依次检查
//! `isActive`、`isApproved`，角色以库中当前值为准。

mod jwt;
mod password;
mod users;

use domain::{Principal, Role};
use fire_storage::{StorageError, UserRecord, UserStore};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

pub use jwt::JwtManager;
pub use password::{
    MIN_PASSWORD_LEN, PasswordCheck, check_password_policy, hash_password,
    verify_password_and_maybe_upgrade,
};
pub use users::UserChanges;

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("authentication required")]
    Unauthenticated,
    #[error("account is inactive")]
    AccountInactive,
    #[error("account is awaiting approval")]
    AccountUnapproved,
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// 登录/刷新返回的 token 结构。
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_jti: String,
    pub expires_at: u64,
}

/// 注册信息。
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
}

/// 认证服务实现（基于 UserStore + JWT）。
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl AuthService {
    /// 创建认证服务实例。
    pub fn new(user_store: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { user_store, jwt }
    }

    /// 注册新用户；仅 admin 角色注册即审批通过。
    pub async fn register(&self, input: Registration) -> Result<UserRecord, AuthError> {
        require_text(&input.username, "username")?;
        require_text(&input.first_name, "firstName")?;
        require_text(&input.last_name, "lastName")?;
        validate_email(&input.email)?;
        check_password_policy(&input.password)?;
        let role = parse_role(&input.role)?;

        let record = UserRecord {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password: hash_password(&input.password)?,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: input.phone.filter(|phone| !phone.trim().is_empty()),
            role,
            is_approved: role == Role::Admin,
            is_active: true,
            created_at_ms: now_epoch_millis(),
        };
        let created = self.user_store.create_user(record).await?;
        info!(
            target: "fire.auth",
            user_id = %created.user_id,
            role = %created.role,
            approved = created.is_approved,
            "user_registered"
        );
        Ok(created)
    }

    /// 邮箱 + 口令登录并签发 token。
    ///
    /// 口令校验先于账户状态检查，未知邮箱与错误口令返回同一错误。
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, AuthTokens), AuthError> {
        let user = self
            .user_store
            .find_by_email(email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let check = verify_password_and_maybe_upgrade(&user.password, password)?;
        if !check.verified {
            warn!(target: "fire.auth", user_id = %user.user_id, "login_rejected");
            return Err(AuthError::InvalidCredentials);
        }
        if let Some(password_hash) = check.upgrade_hash {
            let updated = self
                .user_store
                .update_password_hash(&user.user_id, &password_hash)
                .await?;
            if !updated {
                return Err(AuthError::Internal(
                    "password migration update failed".to_string(),
                ));
            }
        }
        ensure_account_usable(&user)?;

        let tokens = self.jwt.issue_tokens(&user.to_principal())?;
        self.bind_refresh_jti(&user.user_id, &tokens.refresh_jti)
            .await?;
        info!(target: "fire.auth", user_id = %user.user_id, "login_succeeded");
        Ok((user, tokens))
    }

    /// 使用 refresh token 换取新 token（单次有效，旧 token 立即作废）。
    pub async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError> {
        let (principal, jti) = self.jwt.decode_refresh(token)?;
        let stored = self.user_store.get_refresh_jti(&principal.user_id).await?;
        if stored.as_deref() != Some(jti.as_str()) {
            return Err(AuthError::TokenInvalid);
        }
        let user = self
            .user_store
            .find_user(&principal.user_id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;
        ensure_account_usable(&user)?;

        let tokens = self.jwt.issue_tokens(&user.to_principal())?;
        self.bind_refresh_jti(&user.user_id, &tokens.refresh_jti)
            .await?;
        Ok(tokens)
    }

    /// 访问控制闸门：校验 access token 并解析当前主体。
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claimed = self.jwt.decode_access(token).map_err(|err| match err {
            AuthError::Internal(_) => err,
            _ => AuthError::Unauthenticated,
        })?;
        let user = self
            .user_store
            .find_user(&claimed.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        ensure_account_usable(&user)?;
        Ok(user.to_principal())
    }

    /// 当前用户资料。
    pub async fn profile(&self, principal: &Principal) -> Result<UserRecord, AuthError> {
        self.user_store
            .find_user(&principal.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn bind_refresh_jti(&self, user_id: &str, jti: &str) -> Result<(), AuthError> {
        let updated = self.user_store.set_refresh_jti(user_id, Some(jti)).await?;
        if !updated {
            return Err(AuthError::Internal(
                "refresh token binding update failed".to_string(),
            ));
        }
        Ok(())
    }
}

/// 主体角色不在集合内时返回 `Forbidden`。
pub fn require_role(principal: &Principal, roles: &[Role]) -> Result<(), AuthError> {
    if principal.has_any_role(roles) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn ensure_account_usable(user: &UserRecord) -> Result<(), AuthError> {
    if !user.is_active {
        return Err(AuthError::AccountInactive);
    }
    if !user.is_approved {
        return Err(AuthError::AccountUnapproved);
    }
    Ok(())
}

pub(crate) fn parse_role(value: &str) -> Result<Role, AuthError> {
    value
        .trim()
        .parse::<Role>()
        .map_err(|err| AuthError::Validation(err.to_string()))
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{field} required")));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::Validation("valid email required".to_string())),
    }
}

fn now_epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}
