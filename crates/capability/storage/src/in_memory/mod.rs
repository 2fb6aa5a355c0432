//! 内存存储实现模块
//!
//! 用于本地演示和测试。所有实体共享同一把 `RwLock`，因此级联删除、告警升级
//! 与审批重放天然是原子的。
//!
//! 包含以下实现（均由 `InMemoryStore` 实现）：
//! - UserStore (`user.rs`)
//! - BuildingStore (`building.rs`)
//! - FloorStore (`floor.rs`)
//! - AlarmStore (`alarm.rs`)
//! - AlarmHistoryStore (`history.rs`)
//! - BrigadeStore (`brigade.rs`)
//! - ChangeStore (`change.rs`)

pub mod alarm;
pub mod brigade;
pub mod building;
pub mod change;
pub mod floor;
pub mod history;
pub mod user;

use crate::error::StorageError;
use crate::models::{
    AlarmHistoryRecord, BrigadeRecord, BuildingRecord, FireAlarmRecord, FloorRecord,
    PendingChangeRecord, UserRecord,
};
use domain::Role;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 内存中的全部实体
#[derive(Default)]
pub(crate) struct FireState {
    pub(crate) users: HashMap<String, UserRecord>,
    pub(crate) refresh_jtis: HashMap<String, String>,
    pub(crate) buildings: HashMap<String, BuildingRecord>,
    pub(crate) floors: HashMap<String, FloorRecord>,
    pub(crate) alarms: HashMap<String, FireAlarmRecord>,
    pub(crate) history: Vec<AlarmHistoryRecord>,
    pub(crate) brigades: HashMap<String, BrigadeRecord>,
    pub(crate) changes: Vec<PendingChangeRecord>,
}

/// 内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<FireState>,
}

impl InMemoryStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置 admin 账户
    ///
    /// 邮箱 admin@fire.local，口令 admin123（明文，首次登录时升级为 argon2）。
    pub fn with_default_admin() -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.users.insert(
                "user-admin".to_string(),
                UserRecord {
                    user_id: "user-admin".to_string(),
                    username: "admin".to_string(),
                    email: "admin@fire.local".to_string(),
                    password: "admin123".to_string(),
                    first_name: "System".to_string(),
                    last_name: "Administrator".to_string(),
                    phone: None,
                    role: Role::Admin,
                    is_approved: true,
                    is_active: true,
                    created_at_ms: 0,
                },
            );
        }
        store
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, FireState>, StorageError> {
        self.state
            .read()
            .map_err(|_| StorageError::new("lock failed"))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, FireState>, StorageError> {
        self.state
            .write()
            .map_err(|_| StorageError::new("lock failed"))
    }
}
