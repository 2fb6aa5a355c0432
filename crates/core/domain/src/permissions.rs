//! 角色与各操作允许的角色集合。

use crate::status::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 用户角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Duty,
    Dispatcher,
    Firefighter,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duty => "duty",
            Self::Dispatcher => "dispatcher",
            Self::Firefighter => "firefighter",
            Self::Admin => "admin",
        }
    }

    /// 变更是否直接落库；其余角色提交 PendingChange 等待审批。
    pub fn applies_directly(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "duty" => Ok(Self::Duty),
            "dispatcher" => Ok(Self::Dispatcher),
            "firefighter" => Ok(Self::Firefighter),
            "admin" => Ok(Self::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ALL_ROLES: &[Role] = &[Role::Duty, Role::Dispatcher, Role::Firefighter, Role::Admin];

/// 用户管理（列表、审批、修改、删除）。
pub const USER_ADMIN: &[Role] = &[Role::Admin];
/// 建筑创建/删除、楼层创建/删除。
pub const SITE_MANAGE: &[Role] = &[Role::Admin];
/// 建筑/楼层/告警器编辑：admin 直接生效，duty 进入审批。
pub const PLAN_EDIT: &[Role] = &[Role::Admin, Role::Duty];
pub const CHANGE_REVIEW: &[Role] = &[Role::Admin];
pub const HISTORY_GLOBAL_READ: &[Role] = &[Role::Admin, Role::Dispatcher];
pub const BRIGADE_READ: &[Role] = &[Role::Admin, Role::Dispatcher];
pub const BRIGADE_AVAILABLE_READ: &[Role] = &[Role::Dispatcher];
pub const BRIGADE_MANAGE: &[Role] = &[Role::Admin];
pub const BRIGADE_DISPATCH: &[Role] = &[Role::Dispatcher];
pub const METRICS_READ: &[Role] = &[Role::Admin];
