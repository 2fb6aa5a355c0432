//! 存储层数据模型
//!
//! 定义各实体的持久化记录结构以及原子操作的输入/结果类型：
//! - UserRecord / UserUpdate：用户
//! - BuildingRecord / FloorRecord：建筑与楼层
//! - FireAlarmRecord：告警器
//! - BrigadeRecord / BrigadeAssignment / BrigadeUpdate：消防队
//! - AlarmHistoryRecord / AlarmHistoryFilter：告警历史
//! - PendingChangeRecord：待审批变更
//!
//! 时间字段统一为 Unix 毫秒（`*_ms`）。

use domain::{
    AlarmStatus, BrigadeStatus, BuildingStatus, ChangeMutation, ChangeStatus, ChangeTarget,
    ChangeType, Coordinates, Principal, Role,
};

/// 用户记录
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// argon2 PHC 字符串；历史明文口令在首次登录时升级
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_approved: bool,
    pub is_active: bool,
    pub created_at_ms: i64,
}

impl UserRecord {
    pub fn to_principal(&self) -> Principal {
        Principal::new(self.user_id.clone(), self.role)
    }
}

/// 用户更新（字段为 None 表示不修改）
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    /// 已哈希的新口令
    pub password: Option<String>,
}

/// 建筑记录
#[derive(Debug, Clone)]
pub struct BuildingRecord {
    pub building_id: String,
    pub name: String,
    pub address: String,
    pub floors: i32,
    pub status: BuildingStatus,
    pub created_by: String,
    pub duty_officers: Vec<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// 楼层记录
#[derive(Debug, Clone)]
pub struct FloorRecord {
    pub floor_id: String,
    pub building_id: String,
    pub floor_number: i32,
    pub plan_image_path: String,
    pub status: BuildingStatus,
    pub updated_at_ms: i64,
}

/// 告警器记录
#[derive(Debug, Clone)]
pub struct FireAlarmRecord {
    pub alarm_id: String,
    pub building_id: String,
    pub floor_id: String,
    pub name: String,
    pub kind: String,
    pub status: AlarmStatus,
    pub coordinates: Coordinates,
    pub last_updated_ms: i64,
}

/// 消防队当前任务；空任务等价于 `Default`（status = available）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrigadeAssignment {
    pub building_id: Option<String>,
    pub assigned_at_ms: Option<i64>,
    pub assigned_by: Option<String>,
    pub status: BrigadeStatus,
}

/// 消防队记录
///
/// 不变式：`is_available == assignment.building_id.is_none()`。
#[derive(Debug, Clone)]
pub struct BrigadeRecord {
    pub brigade_id: String,
    pub name: String,
    pub members: Vec<String>,
    pub is_available: bool,
    pub assignment: BrigadeAssignment,
}

/// 消防队更新
#[derive(Debug, Clone, Default)]
pub struct BrigadeUpdate {
    pub name: Option<String>,
    pub members: Option<Vec<String>>,
}

/// 告警历史记录（只追加；resolved_* 只写一次）
#[derive(Debug, Clone)]
pub struct AlarmHistoryRecord {
    pub history_id: String,
    pub building_id: String,
    pub floor_id: String,
    pub alarm_id: String,
    pub status: AlarmStatus,
    pub timestamp_ms: i64,
    pub resolved_at_ms: Option<i64>,
    pub resolved_by: Option<String>,
}

/// 告警历史查询条件
#[derive(Debug, Clone, Default)]
pub struct AlarmHistoryFilter {
    pub building_id: Option<String>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub status: Option<AlarmStatus>,
    pub limit: Option<usize>,
}

/// 待审批变更记录
#[derive(Debug, Clone)]
pub struct PendingChangeRecord {
    pub change_id: String,
    pub target: ChangeTarget,
    pub mutation: ChangeMutation,
    pub requested_by: String,
    pub requested_at_ms: i64,
    pub status: ChangeStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at_ms: Option<i64>,
    pub rejection_reason: Option<String>,
}

impl PendingChangeRecord {
    pub fn change_type(&self) -> ChangeType {
        self.mutation.change_type()
    }
}

/// 审批人与审批时间
#[derive(Debug, Clone)]
pub struct ChangeReview {
    pub reviewer: String,
    pub reviewed_at_ms: i64,
}

/// 告警状态流转（比较并交换）
///
/// 仅当告警器当前状态仍为 `expected` 时写入 `next`；`history` 与 `escalate`
/// 在同一原子操作内生效。
#[derive(Debug, Clone)]
pub struct AlarmTransition {
    pub alarm_id: String,
    pub expected: AlarmStatus,
    pub next: AlarmStatus,
    pub at_ms: i64,
    pub history: Option<AlarmHistoryRecord>,
    /// 将所属楼层与建筑置为 fire
    pub escalate: bool,
}

/// 变更落库后的实体
#[derive(Debug, Clone)]
pub enum AppliedChange {
    AlarmCreated(FireAlarmRecord),
    AlarmUpdated(FireAlarmRecord),
    AlarmDeleted(String),
    BuildingUpdated(BuildingRecord),
    FloorUpdated(FloorRecord),
}

/// 直接应用变更的结果
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    Applied(AppliedChange),
    /// 目标实体不存在（"alarm" | "building" | "floor"）
    TargetMissing(&'static str),
}

/// 审批通过的结果；除 Approved 外均不产生任何写入
#[derive(Debug, Clone)]
pub enum ApproveOutcome {
    Approved {
        change: PendingChangeRecord,
        applied: AppliedChange,
    },
    NotFound,
    AlreadyReviewed(ChangeStatus),
    TargetMissing(&'static str),
}

/// 告警解除结果
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Resolved {
        record: AlarmHistoryRecord,
        /// 实时告警器是否由 alarm 复位为 normal
        alarm_reset: bool,
    },
    NotFound,
    AlreadyResolved,
}
