//! # PostgreSQL 存储实现模块
//!
//! 所有存储接口由同一个 `PgStore` 实现，共享一个连接池。表结构见仓库根目录
//! `migrations/0001_init.sql`。
//!
//! ## 约定
//!
//! - 所有 SQL 使用参数绑定（`$1`, `$2` ...）
//! - 时间列为 `timestamptz`，写入时绑定毫秒浮点数 `to_timestamp($n / 1000.0)`，
//!   读取时换算为 `*_ms` 毫秒整数
//! - 枚举列以文本存储，读取时经 `FromStr` 解析，非法值转为 `StorageError`
//! - 存在竞争的检查后写入使用带条件的 `update ... where status = $n`
//! - 多表写入（级联删除、告警升级、审批重放）在事务内完成，审批先
//!   `select ... for update` 锁定变更行

pub mod alarm;
pub mod brigade;
pub mod building;
pub mod change;
pub mod floor;
pub mod history;
pub mod user;

use crate::error::StorageError;
use sqlx::PgPool;
use std::str::FromStr;

pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 通过数据库 URL 建立连接池
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url, max_connections).await?;
        Ok(Self { pool })
    }
}

/// 解析文本列中的枚举值
pub(crate) fn parse_enum<T>(value: &str) -> Result<T, StorageError>
where
    T: FromStr<Err = domain::ParseEnumError>,
{
    Ok(value.parse::<T>()?)
}

/// 毫秒时间戳转换为 `to_timestamp($n / 1000.0)` 的绑定值
pub(crate) fn ms_param(ms: i64) -> f64 {
    ms as f64
}
