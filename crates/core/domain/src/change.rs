//! 变更请求（PendingChange）的封闭变体。
//!
//! 受限角色对告警器位置、建筑平面、楼层平面的修改不会直接落库，而是编码为
//! `ChangeMutation` 存入审批队列。变体在提交时即完成形状校验，审批时按变体穷尽
//! 匹配重放。
//!
//! 持久化/传输格式保持 `{ "action": "add" | "update" | "delete", "data": {...} }`，
//! 由 `ChangeType` + action 共同决定变体。

use crate::status::{BuildingStatus, ChangeType, ParseEnumError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 平面图坐标。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 新增告警器所需字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Coordinates,
}

/// 告警器可编辑字段（不含 status，状态只走状态流转接口）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl AlarmPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.coordinates.is_none()
    }
}

/// 建筑部分更新。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_officers: Option<Vec<String>>,
}

impl BuildingPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.floors.is_none()
            && self.status.is_none()
            && self.duty_officers.is_none()
    }
}

/// 楼层部分更新。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildingStatus>,
}

impl FloorPatch {
    pub fn is_empty(&self) -> bool {
        self.plan_image_path.is_none() && self.status.is_none()
    }
}

/// 变更动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for ChangeAction {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(ParseEnumError::new("change action", other)),
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 变更请求指向的实体。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTarget {
    pub building_id: String,
    pub floor_id: Option<String>,
    pub alarm_id: Option<String>,
}

/// 变更请求编码/校验错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChangeError {
    #[error("invalid change payload: {0}")]
    Payload(String),
    #[error("{0}")]
    Invalid(String),
}

/// 可延迟执行的变更（封闭集合）。
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeMutation {
    AlarmAdd(AlarmDraft),
    AlarmUpdate(AlarmPatch),
    AlarmDelete,
    BuildingUpdate(BuildingPatch),
    FloorUpdate(FloorPatch),
}

impl ChangeMutation {
    pub fn change_type(&self) -> ChangeType {
        match self {
            Self::AlarmAdd(_) | Self::AlarmUpdate(_) | Self::AlarmDelete => ChangeType::AlarmPosition,
            Self::BuildingUpdate(_) => ChangeType::BuildingPlan,
            Self::FloorUpdate(_) => ChangeType::FloorPlan,
        }
    }

    pub fn action(&self) -> ChangeAction {
        match self {
            Self::AlarmAdd(_) => ChangeAction::Add,
            Self::AlarmUpdate(_) | Self::BuildingUpdate(_) | Self::FloorUpdate(_) => {
                ChangeAction::Update
            }
            Self::AlarmDelete => ChangeAction::Delete,
        }
    }

    /// 校验变体数据形状以及目标 ID 是否齐全。
    pub fn validate(&self, target: &ChangeTarget) -> Result<(), ChangeError> {
        if target.building_id.trim().is_empty() {
            return Err(ChangeError::Invalid("buildingId required".to_string()));
        }
        match self {
            Self::AlarmAdd(draft) => {
                require_id(&target.floor_id, "floorId")?;
                require_text(&draft.name, "name")?;
                require_text(&draft.kind, "type")?;
                require_coordinates(&draft.coordinates)
            }
            Self::AlarmUpdate(patch) => {
                require_id(&target.alarm_id, "alarmId")?;
                if patch.is_empty() {
                    return Err(ChangeError::Invalid("empty update".to_string()));
                }
                if let Some(name) = &patch.name {
                    require_text(name, "name")?;
                }
                if let Some(kind) = &patch.kind {
                    require_text(kind, "type")?;
                }
                if let Some(coordinates) = &patch.coordinates {
                    require_coordinates(coordinates)?;
                }
                Ok(())
            }
            Self::AlarmDelete => require_id(&target.alarm_id, "alarmId"),
            Self::BuildingUpdate(patch) => {
                if patch.is_empty() {
                    return Err(ChangeError::Invalid("empty update".to_string()));
                }
                if let Some(name) = &patch.name {
                    require_text(name, "name")?;
                }
                if let Some(address) = &patch.address {
                    require_text(address, "address")?;
                }
                if let Some(floors) = patch.floors {
                    if floors < 1 {
                        return Err(ChangeError::Invalid("floors must be at least 1".to_string()));
                    }
                }
                Ok(())
            }
            Self::FloorUpdate(patch) => {
                require_id(&target.floor_id, "floorId")?;
                if patch.is_empty() {
                    return Err(ChangeError::Invalid("empty update".to_string()));
                }
                if let Some(path) = &patch.plan_image_path {
                    require_text(path, "planImagePath")?;
                }
                Ok(())
            }
        }
    }

    /// 编码为 `{action, data}`。
    pub fn to_changes(&self) -> Result<Value, ChangeError> {
        let data = match self {
            Self::AlarmAdd(draft) => encode(draft)?,
            Self::AlarmUpdate(patch) => encode(patch)?,
            Self::AlarmDelete => Value::Object(Map::new()),
            Self::BuildingUpdate(patch) => encode(patch)?,
            Self::FloorUpdate(patch) => encode(patch)?,
        };
        let mut changes = Map::new();
        changes.insert(
            "action".to_string(),
            Value::String(self.action().as_str().to_string()),
        );
        changes.insert("data".to_string(), data);
        Ok(Value::Object(changes))
    }

    /// 由类型 + `{action, data}` 解码，不支持的组合直接拒绝。
    pub fn from_changes(change_type: ChangeType, changes: &Value) -> Result<Self, ChangeError> {
        let action = changes
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ChangeError::Payload("action required".to_string()))?;
        let action = action
            .parse::<ChangeAction>()
            .map_err(|err| ChangeError::Payload(err.to_string()))?;
        let data = changes.get("data").cloned().unwrap_or(Value::Null);
        match (change_type, action) {
            (ChangeType::AlarmPosition, ChangeAction::Add) => Ok(Self::AlarmAdd(decode(data)?)),
            (ChangeType::AlarmPosition, ChangeAction::Update) => {
                Ok(Self::AlarmUpdate(decode(data)?))
            }
            (ChangeType::AlarmPosition, ChangeAction::Delete) => Ok(Self::AlarmDelete),
            (ChangeType::BuildingPlan, ChangeAction::Update) => {
                Ok(Self::BuildingUpdate(decode(data)?))
            }
            (ChangeType::FloorPlan, ChangeAction::Update) => Ok(Self::FloorUpdate(decode(data)?)),
            (change_type, action) => Err(ChangeError::Payload(format!(
                "action {action} not supported for {change_type}"
            ))),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ChangeError> {
    serde_json::to_value(value).map_err(|err| ChangeError::Payload(err.to_string()))
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ChangeError> {
    serde_json::from_value(data).map_err(|err| ChangeError::Payload(err.to_string()))
}

fn require_id(value: &Option<String>, field: &str) -> Result<(), ChangeError> {
    match value.as_deref() {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => Err(ChangeError::Invalid(format!("{field} required"))),
    }
}

fn require_text(value: &str, field: &str) -> Result<(), ChangeError> {
    if value.trim().is_empty() {
        return Err(ChangeError::Invalid(format!("{field} required")));
    }
    Ok(())
}

fn require_coordinates(coordinates: &Coordinates) -> Result<(), ChangeError> {
    if !coordinates.is_finite() {
        return Err(ChangeError::Invalid("coordinates must be finite".to_string()));
    }
    Ok(())
}
