//! Conversion of raw SpaceX launch objects into mission mappings.

use serde_json::{Map, Value};

/// A loosely-typed mission mapping as produced by the parser.
pub type RawMission = Map<String, Value>;

/// Keys copied unchanged from a launch object when present.
const PASS_THROUGH_KEYS: &[&str] = &["details", "rocket", "flight_number"];

/// Derive a mission status from SpaceX launch flags.
fn derive_status(launch: &Map<String, Value>) -> Option<&'static str> {
    if launch.get("upcoming").and_then(Value::as_bool) == Some(true) {
        return Some("ongoing");
    }
    match launch.get("success").and_then(Value::as_bool) {
        Some(true) => Some("completed"),
        Some(false) => Some("failed"),
        None => None,
    }
}

/// Map each launch object onto a mission mapping with `name`, `status` and
/// pass-through keys. Non-object entries are dropped.
///
/// An explicit `status` key on the launch wins over the derived one. The
/// launch date comes from `date_utc`, falling back to `launch_date`.
pub fn parse_mission_data(launches: &[Value]) -> Vec<RawMission> {
    launches
        .iter()
        .filter_map(|launch| match launch {
            Value::Object(launch) => Some(parse_launch(launch)),
            other => {
                tracing::debug!("Ignoring non-object launch entry: {}", other);
                None
            }
        })
        .collect()
}

fn parse_launch(launch: &Map<String, Value>) -> RawMission {
    let mut mission = RawMission::new();

    if let Some(name) = launch.get("name") {
        mission.insert("name".to_string(), name.clone());
    }

    match launch.get("status") {
        Some(status) => {
            mission.insert("status".to_string(), status.clone());
        }
        None => {
            if let Some(status) = derive_status(launch) {
                mission.insert("status".to_string(), Value::String(status.to_string()));
            }
        }
    }

    if let Some(date) = launch.get("date_utc").or_else(|| launch.get("launch_date")) {
        mission.insert("launch_date".to_string(), date.clone());
    }

    for key in PASS_THROUGH_KEYS {
        if let Some(value) = launch.get(*key) {
            mission.insert(key.to_string(), value.clone());
        }
    }

    mission
}
