//! Postgres 用户存储实现

use super::{PgStore, ms_param, parse_enum};
use crate::error::StorageError;
use crate::models::{UserRecord, UserUpdate};
use crate::traits::UserStore;
use sqlx::Row;
use sqlx::postgres::PgRow;

const USER_COLUMNS: &str = "user_id, username, email, password_hash, first_name, last_name, \
     phone, role, is_approved, is_active, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms";

fn user_from_row(row: &PgRow) -> Result<UserRecord, StorageError> {
    let role: String = row.try_get("role")?;
    Ok(UserRecord {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        role: parse_enum(&role)?,
        is_approved: row.try_get("is_approved")?,
        is_active: row.try_get("is_active")?,
        created_at_ms: row.try_get("created_at_ms")?,
    })
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!("select {USER_COLUMNS} from users where user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {USER_COLUMNS} from users where username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "select {USER_COLUMNS} from users where lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, record: UserRecord) -> Result<UserRecord, StorageError> {
        sqlx::query(
            "insert into users \
             (user_id, username, email, password_hash, first_name, last_name, phone, role, \
              is_approved, is_active, created_at) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, to_timestamp($11 / 1000.0))",
        )
        .bind(&record.user_id)
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.password)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.phone)
        .bind(record.role.as_str())
        .bind(record.is_approved)
        .bind(record.is_active)
        .bind(ms_param(record.created_at_ms))
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_users(&self, approved: Option<bool>) -> Result<Vec<UserRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "select {USER_COLUMNS} from users \
             where ($1::boolean is null or is_approved = $1) \
             order by created_at asc"
        ))
        .bind(approved)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "update users set \
             username = coalesce($2, username), \
             email = coalesce($3, email), \
             first_name = coalesce($4, first_name), \
             last_name = coalesce($5, last_name), \
             phone = coalesce($6, phone), \
             role = coalesce($7, role), \
             is_active = coalesce($8, is_active), \
             is_approved = coalesce($9, is_approved), \
             password_hash = coalesce($10, password_hash) \
             where user_id = $1 \
             returning {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(update.username)
        .bind(update.email)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.phone)
        .bind(update.role.map(|role| role.as_str()))
        .bind(update.is_active)
        .bind(update.is_approved)
        .bind(update.password)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from users where user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set password_hash = $2 where user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_refresh_jti(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("select refresh_jti from users where user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.flatten())
    }

    async fn set_refresh_jti(
        &self,
        user_id: &str,
        jti: Option<&str>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("update users set refresh_jti = $2 where user_id = $1")
            .bind(user_id)
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
