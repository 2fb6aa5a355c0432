//! 领域模型：主体（Principal）、角色、状态枚举与变更请求变体。

pub mod change;
pub mod permissions;
pub mod status;

pub use change::{
    AlarmDraft, AlarmPatch, BuildingPatch, ChangeAction, ChangeError, ChangeMutation, ChangeTarget,
    Coordinates, FloorPatch,
};
pub use permissions::Role;
pub use status::{
    AlarmStatus, BrigadeStatus, BuildingStatus, ChangeStatus, ChangeType, ParseEnumError,
};

/// 请求主体：已通过访问控制的用户身份，所有模块共享的执行上下文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// 主体角色是否在给定集合内。
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
