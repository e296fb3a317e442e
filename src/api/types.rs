//! API request and response types.

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::mission_store::{parse_launch_date, Mission, MissionQuery, MissionSort};

/// Plain `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> u32 {
    10
}

/// Query string of `GET /missions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListMissionsParams {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_size")]
    pub size: u32,

    pub start_date: Option<String>,
    pub end_date: Option<String>,

    /// Case-sensitive substring of the mission name
    pub keyword: Option<String>,

    /// Column to order by; unknown columns are ignored
    pub sort_by: Option<String>,

    /// `asc` (default); any other value sorts descending
    pub sort_order: Option<String>,
}

fn parse_date_param(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<chrono::NaiveDateTime>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_launch_date(raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}: {}", field, raw))),
    }
}

impl ListMissionsParams {
    pub fn to_query(&self) -> Result<MissionQuery, ApiError> {
        Ok(MissionQuery {
            page: self.page,
            size: self.size,
            start_date: parse_date_param("start_date", self.start_date.as_deref())?,
            end_date: parse_date_param("end_date", self.end_date.as_deref())?,
            keyword: self.keyword.clone(),
            sort: MissionSort::parse(self.sort_by.as_deref(), self.sort_order.as_deref()),
        })
    }
}

/// Response of `GET /missions/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMissionsResponse {
    pub missions: Vec<Mission>,
    pub page: i64,
    pub size: u32,
}
