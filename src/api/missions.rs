//! Mission endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery};
use super::mission_store::{Mission, NewMission};
use super::routes::AppState;
use super::types::{ListMissionsParams, ListMissionsResponse, MessageResponse};
use crate::scheduler;

/// List missions with pagination and optional filtering.
pub async fn list_missions(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListMissionsParams>,
) -> Result<Json<ListMissionsResponse>, ApiError> {
    let query = params.to_query()?;
    let missions = state.store.query_missions(&query).await?;
    Ok(Json(ListMissionsResponse {
        missions,
        page: params.page,
        size: params.size,
    }))
}

/// Create a new mission. Unlike the sync path this never overwrites an
/// existing mission: a taken name is a client error.
pub async fn create_mission(
    State(state): State<Arc<AppState>>,
    ApiJson(mission): ApiJson<NewMission>,
) -> Result<Json<Mission>, ApiError> {
    if state.store.get_mission_by_name(&mission.name).await?.is_some() {
        return Err(ApiError::BadRequest("Mission already exists".to_string()));
    }

    let created = state.store.create_mission(mission).await?;
    tracing::info!("Created mission '{}' (id {})", created.name, created.id);
    Ok(Json(created))
}

/// Kick off a background refresh-and-sync and return immediately.
pub async fn trigger_update(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    scheduler::spawn_sync_run(Arc::clone(&state.store), Arc::clone(&state.feed));
    Json(MessageResponse::new("SpaceX missions update initiated."))
}

/// Return the cached raw launch payload.
pub async fn spacex_launches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    state
        .feed
        .current()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("SpaceX launches not found!".to_string()))
}
