//! 应用运行配置加载。
//!
//! 所有配置项以 `FIRE_` 为前缀，从环境变量读取（`.env` 由二进制在启动时通过
//! dotenvy 载入）。格式错误的值直接导致启动失败。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 为 None 时使用内存存储
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_access_ttl_seconds: u64,
    pub jwt_refresh_ttl_seconds: u64,
    /// 通知广播缓冲区容量
    pub notify_capacity: usize,
    /// 全局告警历史单页上限
    pub history_limit: usize,
    /// 内存模式下是否预置 admin 账户
    pub seed_admin: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reader = Reader { lookup };
        let jwt_secret = reader
            .optional("FIRE_JWT_SECRET")
            .ok_or_else(|| ConfigError::Missing("FIRE_JWT_SECRET".to_string()))?;
        let jwt_access_ttl_seconds = reader.required_u64("FIRE_JWT_ACCESS_TTL_SECONDS")?;
        let jwt_refresh_ttl_seconds = reader.required_u64("FIRE_JWT_REFRESH_TTL_SECONDS")?;
        let http_addr = reader
            .optional("FIRE_HTTP_ADDR")
            .unwrap_or_else(|| "127.0.0.1:5000".to_string());
        let database_url = reader.optional("FIRE_DATABASE_URL");
        let db_max_connections = reader.parsed_or("FIRE_DB_MAX_CONNECTIONS", 8u32)?;
        let notify_capacity = reader.parsed_or("FIRE_NOTIFY_CAPACITY", 256usize)?;
        let history_limit = reader.parsed_or("FIRE_HISTORY_LIMIT", 100usize)?;
        let seed_admin = reader.bool_or("FIRE_SEED_ADMIN", true)?;

        if notify_capacity == 0 {
            return Err(ConfigError::Invalid(
                "FIRE_NOTIFY_CAPACITY".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            jwt_secret,
            jwt_access_ttl_seconds,
            jwt_refresh_ttl_seconds,
            notify_capacity,
            history_limit,
            seed_admin,
        })
    }
}

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 空字符串视为未设置。
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn required_u64(&self, key: &str) -> Result<u64, ConfigError> {
        let value = self
            .optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
            None => Ok(default),
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "0" | "false" | "off" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        }
    }
}
