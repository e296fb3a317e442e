//! Mission storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database (default)

mod memory;
mod sqlite;

pub use memory::InMemoryMissionStore;
pub use sqlite::SqliteMissionStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A mission record, keyed by its unique `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: i64,
    pub name: String,
    /// Free-form status ("completed", "ongoing", ...)
    pub status: String,
    pub launch_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rocket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a mission directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMission {
    pub name: String,
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_launch_date")]
    pub launch_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub rocket: Option<String>,
    #[serde(default)]
    pub flight_number: Option<i64>,
}

impl NewMission {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            launch_date: None,
            details: None,
            rocket: None,
            flight_number: None,
        }
    }

    pub fn with_launch_date(mut self, launch_date: NaiveDateTime) -> Self {
        self.launch_date = Some(launch_date);
        self
    }
}

/// Incoming field values for an upsert.
///
/// The outer `Option` of each optional field records whether the source
/// supplied it at all; only supplied fields overwrite an existing record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissionPatch {
    pub name: String,
    pub status: String,
    pub launch_date: Option<Option<NaiveDateTime>>,
    pub details: Option<Option<String>>,
    pub rocket: Option<Option<String>>,
    pub flight_number: Option<Option<i64>>,
}

impl MissionPatch {
    /// Overwrite every supplied field on an existing mission.
    pub fn apply_to(&self, mission: &mut Mission) {
        mission.status = self.status.clone();
        if let Some(launch_date) = self.launch_date {
            mission.launch_date = launch_date;
        }
        if let Some(details) = &self.details {
            mission.details = details.clone();
        }
        if let Some(rocket) = &self.rocket {
            mission.rocket = rocket.clone();
        }
        if let Some(flight_number) = self.flight_number {
            mission.flight_number = flight_number;
        }
    }

    pub fn into_new_mission(self) -> NewMission {
        NewMission {
            name: self.name,
            status: self.status,
            launch_date: self.launch_date.flatten(),
            details: self.details.flatten(),
            rocket: self.rocket.flatten(),
            flight_number: self.flight_number.flatten(),
        }
    }
}

/// Whether an upsert inserted a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Columns a mission listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Status,
    LaunchDate,
    FlightNumber,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    /// Resolve a user-supplied column name. Unknown names yield `None`.
    pub fn parse(column: &str) -> Option<Self> {
        match column {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "launch_date" => Some(Self::LaunchDate),
            "flight_number" => Some(Self::FlightNumber),
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Status => "status",
            Self::LaunchDate => "launch_date",
            Self::FlightNumber => "flight_number",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Ascending comparison on this key's attribute.
    pub fn compare(self, a: &Mission, b: &Mission) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Name => a.name.cmp(&b.name),
            Self::Status => a.status.cmp(&b.status),
            Self::LaunchDate => a.launch_date.cmp(&b.launch_date),
            Self::FlightNumber => a.flight_number.cmp(&b.flight_number),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `asc` keeps ascending order; any other explicit value sorts descending.
    pub fn from_str(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl MissionSort {
    /// Build a sort from raw request values, ignoring unknown columns.
    pub fn parse(column: Option<&str>, order: Option<&str>) -> Option<Self> {
        let key = SortKey::parse(column?)?;
        Some(Self {
            key,
            order: order.map(SortOrder::from_str).unwrap_or_default(),
        })
    }

    pub fn compare(&self, a: &Mission, b: &Mission) -> Ordering {
        let ordering = self.key.compare(a, b);
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Filtered, sorted, paginated view over the mission table.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionQuery {
    /// 1-indexed page number
    pub page: i64,
    pub size: u32,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Case-sensitive substring of the mission name
    pub keyword: Option<String>,
    pub sort: Option<MissionSort>,
}

impl Default for MissionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            start_date: None,
            end_date: None,
            keyword: None,
            sort: None,
        }
    }
}

impl MissionQuery {
    pub fn page(page: i64, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    /// Rows to skip. Pages below 1 clamp to the first page.
    pub fn offset(&self) -> u64 {
        let offset = (self.page.saturating_sub(1)).saturating_mul(i64::from(self.size));
        offset.max(0) as u64
    }

    /// Keyword with empty strings treated as absent.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }

    /// Whether a mission passes every filter of this query.
    pub fn matches(&self, mission: &Mission) -> bool {
        if let Some(start) = self.start_date {
            match mission.launch_date {
                Some(date) if date >= start => {}
                _ => return false,
            }
        }
        if let Some(end) = self.end_date {
            match mission.launch_date {
                Some(date) if date <= end => {}
                _ => return false,
            }
        }
        if let Some(keyword) = self.keyword() {
            if !mission.name.contains(keyword) {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts shown on the index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MissionStats {
    pub total: u64,
    pub completed: u64,
    pub ongoing: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Mission '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to prepare mission store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Get current timestamp as RFC3339 string.
pub fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a launch date in any of the accepted formats.
///
/// Accepts RFC3339 (converted to UTC), naive date-times with `T` or a space
/// separator, and plain dates (midnight).
pub fn parse_launch_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn deserialize_launch_date<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_launch_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid launch_date: {}", raw))),
    }
}

/// Mission store trait - implemented by all storage backends.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Run a filtered, sorted, paginated query.
    async fn query_missions(&self, query: &MissionQuery) -> Result<Vec<Mission>, StoreError>;

    /// Get a single mission by exact name.
    async fn get_mission_by_name(&self, name: &str) -> Result<Option<Mission>, StoreError>;

    /// Insert a new mission. Fails with `StoreError::Duplicate` if the name is taken.
    async fn create_mission(&self, mission: NewMission) -> Result<Mission, StoreError>;

    /// Create the mission if its name is unknown, otherwise overwrite the supplied fields.
    async fn upsert_mission(
        &self,
        patch: MissionPatch,
    ) -> Result<(Mission, UpsertOutcome), StoreError>;

    /// Count all missions, plus completed/ongoing by case-insensitive status.
    async fn mission_stats(&self) -> Result<MissionStats, StoreError>;
}

/// Shared handle used by handlers and background tasks.
pub type SharedMissionStore = Arc<dyn MissionStore>;

/// Mission store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissionStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl MissionStoreType {
    /// Parse from environment variable value.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::default(),
        }
    }
}

/// Create a mission store based on type and configuration.
pub async fn create_mission_store(
    store_type: MissionStoreType,
    db_path: PathBuf,
) -> Result<SharedMissionStore, StoreError> {
    match store_type {
        MissionStoreType::Memory => Ok(Arc::new(InMemoryMissionStore::new())),
        MissionStoreType::Sqlite => {
            let store = SqliteMissionStore::new(db_path).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backends() -> Vec<(&'static str, SharedMissionStore)> {
        vec![
            ("memory", Arc::new(InMemoryMissionStore::new()) as SharedMissionStore),
            (
                "sqlite",
                Arc::new(SqliteMissionStore::open_in_memory().await.unwrap())
                    as SharedMissionStore,
            ),
        ]
    }

    fn date(raw: &str) -> NaiveDateTime {
        parse_launch_date(raw).expect("valid date")
    }

    async fn seed(store: &SharedMissionStore) {
        let rows = [
            ("Falcon-1", "completed", "2006-03-24"),
            ("Falcon-9 Demo", "ongoing", "2010-06-04"),
            ("falcon heavy", "Completed", "2018-02-06"),
            ("Starlink-1", "ongoing", "2019-05-24"),
            ("Crew-1", "failed", "2020-11-16"),
        ];
        for (name, status, launch) in rows {
            store
                .create_mission(NewMission::new(name, status).with_launch_date(date(launch)))
                .await
                .expect("seed mission");
        }
    }

    fn names(missions: &[Mission]) -> Vec<&str> {
        missions.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_parse_launch_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_launch_date("2020-01-01"), Some(midnight));
        assert_eq!(parse_launch_date("2020-01-01T00:00:00"), Some(midnight));
        assert_eq!(parse_launch_date("2020-01-01 00:00:00"), Some(midnight));
        assert_eq!(parse_launch_date("2020-01-01T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_launch_date("2020-01-01T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_launch_date("not a date"), None);
        assert_eq!(parse_launch_date(""), None);
    }

    #[test]
    fn test_sort_parse_ignores_unknown_columns() {
        assert_eq!(MissionSort::parse(Some("password"), Some("asc")), None);
        assert_eq!(MissionSort::parse(None, Some("desc")), None);
        assert_eq!(
            MissionSort::parse(Some("name"), None),
            Some(MissionSort {
                key: SortKey::Name,
                order: SortOrder::Asc
            })
        );
        assert_eq!(
            MissionSort::parse(Some("launch_date"), Some("DESC")).map(|s| s.order),
            Some(SortOrder::Desc)
        );
        assert_eq!(
            MissionSort::parse(Some("name"), Some("down")).map(|s| s.order),
            Some(SortOrder::Desc)
        );
        assert_eq!(
            MissionSort::parse(Some("name"), Some("ASC")).map(|s| s.order),
            Some(SortOrder::Asc)
        );
    }

    #[test]
    fn test_offset_clamps_low_pages() {
        assert_eq!(MissionQuery::page(1, 10).offset(), 0);
        assert_eq!(MissionQuery::page(3, 10).offset(), 20);
        assert_eq!(MissionQuery::page(0, 10).offset(), 0);
        assert_eq!(MissionQuery::page(-4, 10).offset(), 0);
    }

    #[test]
    fn test_patch_only_overwrites_supplied_fields() {
        let mut mission = Mission {
            id: 1,
            name: "Falcon-1".to_string(),
            status: "completed".to_string(),
            launch_date: Some(date("2006-03-24")),
            details: Some("engine failure".to_string()),
            rocket: Some("falcon1".to_string()),
            flight_number: Some(1),
            created_at: now_string(),
            updated_at: now_string(),
        };
        let patch = MissionPatch {
            name: "Falcon-1".to_string(),
            status: "ongoing".to_string(),
            details: Some(None),
            flight_number: Some(Some(2)),
            ..MissionPatch::default()
        };
        patch.apply_to(&mut mission);

        assert_eq!(mission.status, "ongoing");
        assert_eq!(mission.details, None);
        assert_eq!(mission.flight_number, Some(2));
        assert_eq!(mission.rocket.as_deref(), Some("falcon1"));
        assert_eq!(mission.launch_date, Some(date("2006-03-24")));
    }

    #[test]
    fn test_new_mission_payload_parses_plain_date() {
        let payload: NewMission = serde_json::from_value(serde_json::json!({
            "name": "Artemis",
            "status": "ongoing",
            "launch_date": "2022-11-16"
        }))
        .unwrap();
        assert_eq!(payload.launch_date, Some(date("2022-11-16")));

        let bad = serde_json::from_value::<NewMission>(serde_json::json!({
            "name": "Artemis",
            "status": "ongoing",
            "launch_date": "someday"
        }));
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_distinct_names_are_found_by_name() {
        for (backend, store) in backends().await {
            seed(&store).await;
            for name in ["Falcon-1", "Starlink-1", "Crew-1"] {
                let found = store
                    .get_mission_by_name(name)
                    .await
                    .unwrap()
                    .unwrap_or_else(|| panic!("{backend}: {name} missing"));
                assert_eq!(found.name, name, "{backend}");
            }
            assert!(store.get_mission_by_name("falcon-1").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        for (backend, store) in backends().await {
            store
                .create_mission(NewMission::new("Artemis", "ongoing"))
                .await
                .unwrap();
            let err = store
                .create_mission(NewMission::new("Artemis", "completed"))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Duplicate(ref n) if n == "Artemis"), "{backend}");

            let all = store.query_missions(&MissionQuery::page(1, 100)).await.unwrap();
            assert_eq!(all.len(), 1, "{backend}");
            assert_eq!(all[0].status, "ongoing", "{backend}");
        }
    }

    #[tokio::test]
    async fn test_keyword_filter_is_case_sensitive() {
        for (backend, store) in backends().await {
            seed(&store).await;
            let query = MissionQuery {
                keyword: Some("Falcon".to_string()),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&query).await.unwrap();
            assert_eq!(names(&found), vec!["Falcon-1", "Falcon-9 Demo"], "{backend}");

            let empty_keyword = MissionQuery {
                keyword: Some(String::new()),
                size: 100,
                ..MissionQuery::default()
            };
            assert_eq!(store.query_missions(&empty_keyword).await.unwrap().len(), 5);
        }
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        for (backend, store) in backends().await {
            seed(&store).await;
            store
                .create_mission(NewMission::new("Undated", "ongoing"))
                .await
                .unwrap();

            let query = MissionQuery {
                start_date: Some(date("2010-06-04")),
                end_date: Some(date("2019-05-24")),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&query).await.unwrap();
            assert_eq!(
                names(&found),
                vec!["Falcon-9 Demo", "falcon heavy", "Starlink-1"],
                "{backend}"
            );

            let open_ended = MissionQuery {
                start_date: Some(date("2019-01-01")),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&open_ended).await.unwrap();
            assert_eq!(names(&found), vec!["Starlink-1", "Crew-1"], "{backend}");
        }
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        for (backend, store) in backends().await {
            seed(&store).await;
            let query = MissionQuery {
                keyword: Some("-1".to_string()),
                start_date: Some(date("2019-01-01")),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&query).await.unwrap();
            assert_eq!(names(&found), vec!["Starlink-1", "Crew-1"], "{backend}");
        }
    }

    #[tokio::test]
    async fn test_consecutive_pages_partition_results() {
        for (backend, store) in backends().await {
            seed(&store).await;
            let sort = MissionSort::parse(Some("name"), Some("asc"));
            let page = |p| MissionQuery {
                sort,
                ..MissionQuery::page(p, 2)
            };

            let first = store.query_missions(&page(1)).await.unwrap();
            let second = store.query_missions(&page(2)).await.unwrap();
            let third = store.query_missions(&page(3)).await.unwrap();
            let fourth = store.query_missions(&page(4)).await.unwrap();

            assert_eq!(first.len(), 2, "{backend}");
            assert_eq!(second.len(), 2, "{backend}");
            assert_eq!(third.len(), 1, "{backend}");
            assert!(fourth.is_empty(), "{backend}");

            let all = store
                .query_missions(&MissionQuery {
                    sort,
                    ..MissionQuery::page(1, 100)
                })
                .await
                .unwrap();
            let stitched: Vec<Mission> = first.into_iter().chain(second).chain(third).collect();
            assert_eq!(stitched, all, "{backend}");
        }
    }

    #[tokio::test]
    async fn test_sort_descending_and_unknown_column() {
        for (backend, store) in backends().await {
            seed(&store).await;
            let desc = MissionQuery {
                sort: MissionSort::parse(Some("launch_date"), Some("desc")),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&desc).await.unwrap();
            assert_eq!(
                names(&found),
                vec!["Crew-1", "Starlink-1", "falcon heavy", "Falcon-9 Demo", "Falcon-1"],
                "{backend}"
            );

            let unknown = MissionQuery {
                sort: MissionSort::parse(Some("no_such_column"), Some("desc")),
                size: 100,
                ..MissionQuery::default()
            };
            let found = store.query_missions(&unknown).await.unwrap();
            assert_eq!(
                names(&found),
                vec!["Falcon-1", "Falcon-9 Demo", "falcon heavy", "Starlink-1", "Crew-1"],
                "{backend}"
            );
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_single_record() {
        for (backend, store) in backends().await {
            let first = MissionPatch {
                name: "Falcon-1".to_string(),
                status: "completed".to_string(),
                launch_date: Some(Some(date("2020-01-01"))),
                ..MissionPatch::default()
            };
            let (_, outcome) = store.upsert_mission(first).await.unwrap();
            assert_eq!(outcome, UpsertOutcome::Created, "{backend}");

            let second = MissionPatch {
                name: "Falcon-1".to_string(),
                status: "ongoing".to_string(),
                ..MissionPatch::default()
            };
            let (mission, outcome) = store.upsert_mission(second).await.unwrap();
            assert_eq!(outcome, UpsertOutcome::Updated, "{backend}");
            assert_eq!(mission.status, "ongoing", "{backend}");
            assert_eq!(mission.launch_date, Some(date("2020-01-01")), "{backend}");

            let all = store.query_missions(&MissionQuery::page(1, 100)).await.unwrap();
            assert_eq!(all.len(), 1, "{backend}");
            assert_eq!(all[0].status, "ongoing", "{backend}");
        }
    }

    #[tokio::test]
    async fn test_stats_match_status_case_insensitively() {
        for (backend, store) in backends().await {
            assert_eq!(store.mission_stats().await.unwrap(), MissionStats::default());
            seed(&store).await;
            let stats = store.mission_stats().await.unwrap();
            assert_eq!(
                stats,
                MissionStats {
                    total: 5,
                    completed: 2,
                    ongoing: 2
                },
                "{backend}"
            );
        }
    }

    #[test]
    fn test_store_type_from_str() {
        assert_eq!(MissionStoreType::from_str("memory"), MissionStoreType::Memory);
        assert_eq!(MissionStoreType::from_str("SQLite"), MissionStoreType::Sqlite);
        assert_eq!(MissionStoreType::from_str("bogus"), MissionStoreType::Sqlite);
    }
}
