//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - UserStore：用户存储
//! - BuildingStore：建筑存储
//! - FloorStore：楼层存储
//! - AlarmStore：告警器存储
//! - AlarmHistoryStore：告警历史存储
//! - BrigadeStore：消防队存储
//! - ChangeStore：待审批变更存储
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 存在竞争的"检查后写入"一律由存储层以条件更新完成（比较并交换）
//! - 多文档级联（删除、告警升级、审批重放）在单个事务内完成
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{
    AlarmHistoryFilter, AlarmHistoryRecord, AlarmTransition, ApplyOutcome, ApproveOutcome,
    BrigadeAssignment, BrigadeRecord, BrigadeUpdate, BuildingRecord, ChangeReview,
    FireAlarmRecord, FloorRecord, PendingChangeRecord, ResolveOutcome, UserRecord, UserUpdate,
};
use async_trait::async_trait;
use domain::{AlarmStatus, BrigadeStatus, ChangeMutation, ChangeStatus, ChangeTarget};

/// 用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 创建用户；用户名或邮箱重复返回冲突错误
    async fn create_user(&self, record: UserRecord) -> Result<UserRecord, StorageError>;

    /// 列出用户，`approved` 为 Some 时按审批状态过滤
    async fn list_users(&self, approved: Option<bool>) -> Result<Vec<UserRecord>, StorageError>;

    async fn update_user(
        &self,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<Option<UserRecord>, StorageError>;

    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError>;

    /// 替换口令哈希（明文口令升级）
    async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<bool, StorageError>;

    async fn get_refresh_jti(&self, user_id: &str) -> Result<Option<String>, StorageError>;

    async fn set_refresh_jti(
        &self,
        user_id: &str,
        jti: Option<&str>,
    ) -> Result<bool, StorageError>;
}

/// 建筑存储接口
///
/// 建筑字段更新经由 `ChangeStore::apply_change`，与审批重放共用同一套应用逻辑。
#[async_trait]
pub trait BuildingStore: Send + Sync {
    async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, StorageError>;

    async fn find_building(&self, building_id: &str)
    -> Result<Option<BuildingRecord>, StorageError>;

    /// 名称或地址模糊匹配（大小写不敏感）
    async fn search_buildings(&self, query: &str) -> Result<Vec<BuildingRecord>, StorageError>;

    /// 创建建筑；地址重复返回冲突错误
    async fn create_building(&self, record: BuildingRecord)
    -> Result<BuildingRecord, StorageError>;

    /// 删除建筑（级联删除楼层与告警器）
    async fn delete_building(&self, building_id: &str) -> Result<bool, StorageError>;
}

/// 楼层存储接口
#[async_trait]
pub trait FloorStore: Send + Sync {
    /// 按楼层号升序列出建筑下的楼层
    async fn list_floors(&self, building_id: &str) -> Result<Vec<FloorRecord>, StorageError>;

    async fn find_floor(&self, floor_id: &str) -> Result<Option<FloorRecord>, StorageError>;

    /// 创建楼层；(building_id, floor_number) 重复返回冲突错误
    async fn create_floor(&self, record: FloorRecord) -> Result<FloorRecord, StorageError>;

    /// 删除楼层（级联删除告警器）
    async fn delete_floor(&self, floor_id: &str) -> Result<bool, StorageError>;
}

/// 告警器存储接口
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn list_alarms_by_building(
        &self,
        building_id: &str,
    ) -> Result<Vec<FireAlarmRecord>, StorageError>;

    async fn list_alarms_by_floor(&self, floor_id: &str)
    -> Result<Vec<FireAlarmRecord>, StorageError>;

    async fn list_alarms_by_status(
        &self,
        status: AlarmStatus,
    ) -> Result<Vec<FireAlarmRecord>, StorageError>;

    async fn find_alarm(&self, alarm_id: &str) -> Result<Option<FireAlarmRecord>, StorageError>;

    /// 条件状态流转；当前状态已不是 `expected` 时返回 None 且不写入任何数据
    async fn transition_alarm_status(
        &self,
        transition: AlarmTransition,
    ) -> Result<Option<FireAlarmRecord>, StorageError>;
}

/// 告警历史存储接口
#[async_trait]
pub trait AlarmHistoryStore: Send + Sync {
    /// 按时间倒序列出历史
    async fn list_history(
        &self,
        filter: AlarmHistoryFilter,
    ) -> Result<Vec<AlarmHistoryRecord>, StorageError>;

    async fn find_history(
        &self,
        history_id: &str,
    ) -> Result<Option<AlarmHistoryRecord>, StorageError>;

    /// 解除告警：仅当 resolved_at 为空时写入；原记录为 alarm 且实时告警器仍为
    /// alarm 时同时复位为 normal
    async fn resolve_history(
        &self,
        history_id: &str,
        resolved_by: &str,
        at_ms: i64,
    ) -> Result<ResolveOutcome, StorageError>;
}

/// 消防队存储接口
#[async_trait]
pub trait BrigadeStore: Send + Sync {
    async fn list_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError>;

    async fn list_available_brigades(&self) -> Result<Vec<BrigadeRecord>, StorageError>;

    async fn find_brigade(&self, brigade_id: &str) -> Result<Option<BrigadeRecord>, StorageError>;

    /// 创建消防队；队名重复返回冲突错误
    async fn create_brigade(&self, record: BrigadeRecord) -> Result<BrigadeRecord, StorageError>;

    async fn update_brigade(
        &self,
        brigade_id: &str,
        update: BrigadeUpdate,
    ) -> Result<Option<BrigadeRecord>, StorageError>;

    /// 仅删除空闲的消防队
    async fn delete_brigade_if_available(&self, brigade_id: &str) -> Result<bool, StorageError>;

    /// 仅当 is_available 仍为 true 时写入任务
    async fn assign_if_available(
        &self,
        brigade_id: &str,
        assignment: BrigadeAssignment,
    ) -> Result<Option<BrigadeRecord>, StorageError>;

    /// 仅当存在当前任务时覆盖任务状态
    async fn set_assignment_status(
        &self,
        brigade_id: &str,
        status: BrigadeStatus,
    ) -> Result<Option<BrigadeRecord>, StorageError>;

    /// 清空当前任务并置为可用
    async fn release_brigade(&self, brigade_id: &str)
    -> Result<Option<BrigadeRecord>, StorageError>;
}

/// 待审批变更存储接口
#[async_trait]
pub trait ChangeStore: Send + Sync {
    async fn create_change(
        &self,
        record: PendingChangeRecord,
    ) -> Result<PendingChangeRecord, StorageError>;

    async fn find_change(&self, change_id: &str)
    -> Result<Option<PendingChangeRecord>, StorageError>;

    /// 按提交时间倒序列出
    async fn list_changes(
        &self,
        status: Option<ChangeStatus>,
    ) -> Result<Vec<PendingChangeRecord>, StorageError>;

    /// 直接应用变更（无需审批的角色）
    async fn apply_change(
        &self,
        target: &ChangeTarget,
        mutation: &ChangeMutation,
        at_ms: i64,
    ) -> Result<ApplyOutcome, StorageError>;

    /// 审批通过：重放变更并置为 approved，二者同成同败
    async fn approve_change(
        &self,
        change_id: &str,
        review: ChangeReview,
    ) -> Result<ApproveOutcome, StorageError>;

    /// 驳回：仅当仍为 pending 时写入，否则返回 None
    async fn reject_change(
        &self,
        change_id: &str,
        review: ChangeReview,
        reason: Option<String>,
    ) -> Result<Option<PendingChangeRecord>, StorageError>;
}
