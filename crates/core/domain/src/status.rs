//! 状态枚举（字符串形式与客户端契约逐字一致）。
//!
//! - BuildingStatus：建筑/楼层状态 normal | fire | maintenance
//! - AlarmStatus：告警器状态 normal | alarm | fault | disabled
//! - BrigadeStatus：消防队任务状态 en-route | on-site | returning | available
//! - ChangeStatus：变更请求状态 pending | approved | rejected
//! - ChangeType：变更请求类型 alarm-position | building-plan | floor-plan

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 枚举字符串解析失败。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// 建筑与楼层状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingStatus {
    #[default]
    Normal,
    Fire,
    Maintenance,
}

impl BuildingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fire => "fire",
            Self::Maintenance => "maintenance",
        }
    }
}

impl FromStr for BuildingStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "normal" => Ok(Self::Normal),
            "fire" => Ok(Self::Fire),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(ParseEnumError::new("building status", other)),
        }
    }
}

/// 告警器状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    #[default]
    Normal,
    Alarm,
    Fault,
    Disabled,
}

impl AlarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Alarm => "alarm",
            Self::Fault => "fault",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for AlarmStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "normal" => Ok(Self::Normal),
            "alarm" => Ok(Self::Alarm),
            "fault" => Ok(Self::Fault),
            "disabled" => Ok(Self::Disabled),
            other => Err(ParseEnumError::new("alarm status", other)),
        }
    }
}

/// 消防队当前任务状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrigadeStatus {
    EnRoute,
    OnSite,
    Returning,
    #[default]
    Available,
}

impl BrigadeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnRoute => "en-route",
            Self::OnSite => "on-site",
            Self::Returning => "returning",
            Self::Available => "available",
        }
    }
}

impl FromStr for BrigadeStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "en-route" => Ok(Self::EnRoute),
            "on-site" => Ok(Self::OnSite),
            "returning" => Ok(Self::Returning),
            "available" => Ok(Self::Available),
            other => Err(ParseEnumError::new("brigade status", other)),
        }
    }
}

/// 变更请求审批状态。pending 只能流转一次到 approved 或 rejected。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for ChangeStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseEnumError::new("change status", other)),
        }
    }
}

/// 变更请求类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    AlarmPosition,
    BuildingPlan,
    FloorPlan,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlarmPosition => "alarm-position",
            Self::BuildingPlan => "building-plan",
            Self::FloorPlan => "floor-plan",
        }
    }
}

impl FromStr for ChangeType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "alarm-position" => Ok(Self::AlarmPosition),
            "building-plan" => Ok(Self::BuildingPlan),
            "floor-plan" => Ok(Self::FloorPlan),
            other => Err(ParseEnumError::new("change type", other)),
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display!(BuildingStatus, AlarmStatus, BrigadeStatus, ChangeStatus, ChangeType);
