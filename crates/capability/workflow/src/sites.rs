//! 建筑与楼层
//!
//! 字段更新走审批流（`ApprovalService`），这里只负责创建、查询与级联删除。

use crate::{Stores, WorkflowError, authorize, new_id, now_ms, require_text};
use domain::permissions::SITE_MANAGE;
use domain::{BuildingStatus, Principal};
use fire_storage::{BuildingRecord, FloorRecord};
use tracing::info;

/// 新建建筑。
#[derive(Debug, Clone, Default)]
pub struct BuildingDraft {
    pub name: String,
    pub address: String,
    pub floors: i32,
    pub duty_officers: Vec<String>,
}

/// 新建楼层。
#[derive(Debug, Clone, Default)]
pub struct FloorDraft {
    pub building_id: String,
    pub floor_number: i32,
    pub plan_image_path: String,
}

pub struct SiteService {
    stores: Stores,
}

impl SiteService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, WorkflowError> {
        Ok(self.stores.buildings.list_buildings().await?)
    }

    pub async fn get_building(&self, building_id: &str) -> Result<BuildingRecord, WorkflowError> {
        self.stores
            .buildings
            .find_building(building_id)
            .await?
            .ok_or(WorkflowError::NotFound("building"))
    }

    /// 名称或地址模糊搜索，查询词不能为空。
    pub async fn search_buildings(&self, query: &str) -> Result<Vec<BuildingRecord>, WorkflowError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkflowError::Validation("search query required".to_string()));
        }
        Ok(self.stores.buildings.search_buildings(query).await?)
    }

    pub async fn create_building(
        &self,
        principal: &Principal,
        draft: BuildingDraft,
    ) -> Result<BuildingRecord, WorkflowError> {
        authorize(principal, SITE_MANAGE)?;
        require_text(&draft.name, "name")?;
        require_text(&draft.address, "address")?;
        if draft.floors < 1 {
            return Err(WorkflowError::Validation(
                "floors must be at least 1".to_string(),
            ));
        }
        let now = now_ms();
        let record = BuildingRecord {
            building_id: new_id(),
            name: draft.name.trim().to_string(),
            address: draft.address.trim().to_string(),
            floors: draft.floors,
            status: BuildingStatus::Normal,
            created_by: principal.user_id.clone(),
            duty_officers: draft.duty_officers,
            created_at_ms: now,
            updated_at_ms: now,
        };
        let record = self.stores.buildings.create_building(record).await?;
        info!(
            target: "fire.workflow",
            building_id = %record.building_id,
            created_by = %record.created_by,
            "building_created"
        );
        Ok(record)
    }

    /// 删除建筑及其全部楼层与告警器。
    pub async fn delete_building(
        &self,
        principal: &Principal,
        building_id: &str,
    ) -> Result<(), WorkflowError> {
        authorize(principal, SITE_MANAGE)?;
        if !self.stores.buildings.delete_building(building_id).await? {
            return Err(WorkflowError::NotFound("building"));
        }
        info!(target: "fire.workflow", building_id = %building_id, "building_deleted");
        Ok(())
    }

    /// 按楼层号升序。
    pub async fn list_floors(&self, building_id: &str) -> Result<Vec<FloorRecord>, WorkflowError> {
        self.get_building(building_id).await?;
        Ok(self.stores.floors.list_floors(building_id).await?)
    }

    pub async fn get_floor(&self, floor_id: &str) -> Result<FloorRecord, WorkflowError> {
        self.stores
            .floors
            .find_floor(floor_id)
            .await?
            .ok_or(WorkflowError::NotFound("floor"))
    }

    pub async fn create_floor(
        &self,
        principal: &Principal,
        draft: FloorDraft,
    ) -> Result<FloorRecord, WorkflowError> {
        authorize(principal, SITE_MANAGE)?;
        require_text(&draft.plan_image_path, "planImagePath")?;
        let building = self.get_building(&draft.building_id).await?;
        if draft.floor_number < 1 || draft.floor_number > building.floors {
            return Err(WorkflowError::Validation(format!(
                "floorNumber must be between 1 and {}",
                building.floors
            )));
        }
        let record = FloorRecord {
            floor_id: new_id(),
            building_id: building.building_id,
            floor_number: draft.floor_number,
            plan_image_path: draft.plan_image_path.trim().to_string(),
            status: BuildingStatus::Normal,
            updated_at_ms: now_ms(),
        };
        let record = self.stores.floors.create_floor(record).await?;
        info!(
            target: "fire.workflow",
            floor_id = %record.floor_id,
            building_id = %record.building_id,
            floor_number = record.floor_number,
            "floor_created"
        );
        Ok(record)
    }

    /// 删除楼层及其告警器。
    pub async fn delete_floor(
        &self,
        principal: &Principal,
        floor_id: &str,
    ) -> Result<(), WorkflowError> {
        authorize(principal, SITE_MANAGE)?;
        if !self.stores.floors.delete_floor(floor_id).await? {
            return Err(WorkflowError::NotFound("floor"));
        }
        info!(target: "fire.workflow", floor_id = %floor_id, "floor_deleted");
        Ok(())
    }
}
