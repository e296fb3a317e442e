//! Upsert synchronizer.
//!
//! Reconciles raw launch mappings into the mission store, keyed by exact
//! mission name. Invalid records are skipped one by one; nothing here aborts
//! a batch.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::mission_store::{parse_launch_date, MissionPatch, MissionStore, UpsertOutcome};
use crate::launches::{LaunchFeed, RawMission};

/// Why a raw record was not synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordRejection {
    #[error("missing or empty '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unparseable launch_date '{0}'")]
    BadLaunchDate(String),
}

/// Outcome counts for one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

fn required_text(raw: &RawMission, field: &'static str) -> Result<String, RecordRejection> {
    match raw.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(RecordRejection::MissingField(field))
        }
        Some(_) => Err(RecordRejection::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_text(
    raw: &RawMission,
    field: &'static str,
) -> Result<Option<Option<String>>, RecordRejection> {
    match raw.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
        Some(_) => Err(RecordRejection::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_integer(
    raw: &RawMission,
    field: &'static str,
) -> Result<Option<Option<i64>>, RecordRejection> {
    match raw.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(value) => value
            .as_i64()
            .map(|n| Some(Some(n)))
            .ok_or(RecordRejection::WrongType {
                field,
                expected: "an integer",
            }),
    }
}

fn optional_date(raw: &RawMission) -> Result<Option<Option<NaiveDateTime>>, RecordRejection> {
    match raw.get("launch_date") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => parse_launch_date(s)
            .map(|date| Some(Some(date)))
            .ok_or_else(|| RecordRejection::BadLaunchDate(s.clone())),
        Some(_) => Err(RecordRejection::WrongType {
            field: "launch_date",
            expected: "a date string",
        }),
    }
}

/// Check a raw mapping and build a typed patch from its allow-listed fields.
///
/// Keys outside the allow-list are ignored.
pub fn validate_record(raw: &RawMission) -> Result<MissionPatch, RecordRejection> {
    Ok(MissionPatch {
        name: required_text(raw, "name")?,
        status: required_text(raw, "status")?,
        launch_date: optional_date(raw)?,
        details: optional_text(raw, "details")?,
        rocket: optional_text(raw, "rocket")?,
        flight_number: optional_integer(raw, "flight_number")?,
    })
}

/// Create or update one mission per valid record.
pub async fn upsert_missions(store: &dyn MissionStore, records: &[RawMission]) -> SyncReport {
    let mut report = SyncReport::default();

    for raw in records {
        let patch = match validate_record(raw) {
            Ok(patch) => patch,
            Err(reason) => {
                let record = Value::Object(raw.clone());
                tracing::warn!("Invalid mission data ({}): {}", reason, record);
                report.skipped += 1;
                continue;
            }
        };

        let name = patch.name.clone();
        match store.upsert_mission(patch).await {
            Ok((_, UpsertOutcome::Created)) => report.created += 1,
            Ok((_, UpsertOutcome::Updated)) => report.updated += 1,
            Err(e) => {
                tracing::error!("Failed to upsert mission '{}': {}", name, e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Synchronize whatever the feed currently holds. Absent data is a no-op.
pub async fn sync_from_feed(store: &dyn MissionStore, feed: &LaunchFeed) -> SyncReport {
    let Some(records) = feed.current_missions().await else {
        tracing::info!("No response from SpaceX API; nothing to synchronize");
        return SyncReport::default();
    };

    let report = upsert_missions(store, &records).await;
    tracing::info!(
        "Mission sync finished: {} created, {} updated, {} skipped, {} failed",
        report.created,
        report.updated,
        report.skipped,
        report.failed
    );
    report
}

/// Refresh the feed, then synchronize it into the store.
///
/// Fetch failures are logged and turn the run into a no-op; they are never
/// returned to the caller.
pub async fn refresh_and_sync(store: &dyn MissionStore, feed: &LaunchFeed) -> Option<SyncReport> {
    if let Err(e) = feed.refresh().await {
        if e.is_connection() {
            tracing::warn!("Connection error occurred loading SpaceX data: {}", e);
        } else {
            tracing::warn!("Value error loading SpaceX data: {}", e);
        }
        return None;
    }
    Some(sync_from_feed(store, feed).await)
}
