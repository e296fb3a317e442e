//! In-memory mission store (non-persistent).

use super::{
    now_string, Mission, MissionPatch, MissionQuery, MissionStats, MissionStore, NewMission,
    StoreError, UpsertOutcome,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    /// Kept in insertion order, which is also id order.
    missions: Vec<Mission>,
    next_id: i64,
}

impl Inner {
    fn insert(&mut self, mission: NewMission) -> Mission {
        self.next_id += 1;
        let now = now_string();
        let mission = Mission {
            id: self.next_id,
            name: mission.name,
            status: mission.status,
            launch_date: mission.launch_date,
            details: mission.details,
            rocket: mission.rocket,
            flight_number: mission.flight_number,
            created_at: now.clone(),
            updated_at: now,
        };
        self.missions.push(mission.clone());
        mission
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMissionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MissionStore for InMemoryMissionStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn query_missions(&self, query: &MissionQuery) -> Result<Vec<Mission>, StoreError> {
        let inner = self.inner.read().await;
        let mut missions: Vec<Mission> = inner
            .missions
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        if let Some(sort) = query.sort {
            // Stable sort keeps id order among equal keys.
            missions.sort_by(|a, b| sort.compare(a, b));
        }
        let missions = missions
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.size as usize)
            .collect();
        Ok(missions)
    }

    async fn get_mission_by_name(&self, name: &str) -> Result<Option<Mission>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.missions.iter().find(|m| m.name == name).cloned())
    }

    async fn create_mission(&self, mission: NewMission) -> Result<Mission, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.missions.iter().any(|m| m.name == mission.name) {
            return Err(StoreError::Duplicate(mission.name));
        }
        Ok(inner.insert(mission))
    }

    async fn upsert_mission(
        &self,
        patch: MissionPatch,
    ) -> Result<(Mission, UpsertOutcome), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.missions.iter_mut().find(|m| m.name == patch.name) {
            patch.apply_to(existing);
            existing.updated_at = now_string();
            return Ok((existing.clone(), UpsertOutcome::Updated));
        }
        Ok((inner.insert(patch.into_new_mission()), UpsertOutcome::Created))
    }

    async fn mission_stats(&self) -> Result<MissionStats, StoreError> {
        let inner = self.inner.read().await;
        let mut stats = MissionStats::default();
        for mission in &inner.missions {
            stats.total += 1;
            match mission.status.to_lowercase().as_str() {
                "completed" => stats.completed += 1,
                "ongoing" => stats.ongoing += 1,
                _ => {}
            }
        }
        Ok(stats)
    }
}
