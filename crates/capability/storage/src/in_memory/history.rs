//! 告警历史内存存储实现

use super::InMemoryStore;
use crate::error::StorageError;
use crate::models::{AlarmHistoryFilter, AlarmHistoryRecord, ResolveOutcome};
use crate::traits::AlarmHistoryStore;
use domain::AlarmStatus;

#[async_trait::async_trait]
impl AlarmHistoryStore for InMemoryStore {
    async fn list_history(
        &self,
        filter: AlarmHistoryFilter,
    ) -> Result<Vec<AlarmHistoryRecord>, StorageError> {
        let state = self.read()?;
        let mut items: Vec<AlarmHistoryRecord> = state
            .history
            .iter()
            .filter(|item| {
                filter
                    .building_id
                    .as_deref()
                    .is_none_or(|id| item.building_id == id)
                    && filter.start_ms.is_none_or(|start| item.timestamp_ms >= start)
                    && filter.end_ms.is_none_or(|end| item.timestamp_ms <= end)
                    && filter.status.is_none_or(|status| item.status == status)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        if let Some(limit) = filter.limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    async fn find_history(
        &self,
        history_id: &str,
    ) -> Result<Option<AlarmHistoryRecord>, StorageError> {
        Ok(self
            .read()?
            .history
            .iter()
            .find(|item| item.history_id == history_id)
            .cloned())
    }

    async fn resolve_history(
        &self,
        history_id: &str,
        resolved_by: &str,
        at_ms: i64,
    ) -> Result<ResolveOutcome, StorageError> {
        let mut state = self.write()?;
        let Some(record) = state
            .history
            .iter_mut()
            .find(|item| item.history_id == history_id)
        else {
            return Ok(ResolveOutcome::NotFound);
        };
        if record.resolved_at_ms.is_some() {
            return Ok(ResolveOutcome::AlreadyResolved);
        }
        record.resolved_at_ms = Some(at_ms);
        record.resolved_by = Some(resolved_by.to_string());
        let record = record.clone();

        let mut alarm_reset = false;
        if record.status == AlarmStatus::Alarm {
            if let Some(alarm) = state.alarms.get_mut(&record.alarm_id) {
                if alarm.status == AlarmStatus::Alarm {
                    alarm.status = AlarmStatus::Normal;
                    alarm.last_updated_ms = at_ms;
                    alarm_reset = true;
                }
            }
        }
        Ok(ResolveOutcome::Resolved {
            record,
            alarm_reset,
        })
    }
}
