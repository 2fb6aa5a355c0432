//! 业务流程能力：变更审批与状态流转。
//!
//! - `ApprovalService`（`approval.rs`）：受限角色的编辑转为待审批变更，admin
//!   审批时重放
//! - `AlarmService`（`alarms.rs`）：告警器状态流转、告警历史与解除
//! - `BrigadeService`（`brigades.rs`）：消防队管理、派遣与任务状态
//! - `SiteService`（`sites.rs`）：建筑与楼层的创建、查询、删除
//!
//! 所有服务接收已通过访问控制的 `Principal`，并在入口处再次校验角色集合。
//! 通知经注入的 `Publisher` 发出，发布失败不会影响业务结果。

mod alarms;
mod approval;
mod brigades;
mod sites;

use domain::{ChangeError, Principal, Role};
use fire_storage::{
    AlarmHistoryStore, AlarmStore, BrigadeStore, BuildingStore, ChangeStore, FloorStore,
    StorageError, UserStore,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub use alarms::{AlarmService, HistoryQuery};
pub use approval::{ApprovalService, EditOutcome, ReviewedChange};
pub use brigades::{BrigadeDraft, BrigadeService};
pub use sites::{BuildingDraft, FloorDraft, SiteService};

/// 业务错误。
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidStatus(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("forbidden")]
    Forbidden,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err.to_string())
        } else {
            Self::Storage(err.to_string())
        }
    }
}

impl From<ChangeError> for WorkflowError {
    fn from(err: ChangeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// 各实体存储的动态句柄。
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub buildings: Arc<dyn BuildingStore>,
    pub floors: Arc<dyn FloorStore>,
    pub alarms: Arc<dyn AlarmStore>,
    pub history: Arc<dyn AlarmHistoryStore>,
    pub brigades: Arc<dyn BrigadeStore>,
    pub changes: Arc<dyn ChangeStore>,
}

impl Stores {
    /// 由同时实现全部存储接口的后端构造（内存或 PostgreSQL）。
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: UserStore
            + BuildingStore
            + FloorStore
            + AlarmStore
            + AlarmHistoryStore
            + BrigadeStore
            + ChangeStore
            + 'static,
    {
        Self {
            users: backend.clone(),
            buildings: backend.clone(),
            floors: backend.clone(),
            alarms: backend.clone(),
            history: backend.clone(),
            brigades: backend.clone(),
            changes: backend,
        }
    }
}

/// 角色集合校验。
pub fn authorize(principal: &Principal, roles: &[Role]) -> Result<(), WorkflowError> {
    if principal.has_any_role(roles) {
        Ok(())
    } else {
        Err(WorkflowError::Forbidden)
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{field} required")));
    }
    Ok(())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}
