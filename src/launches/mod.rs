//! External launch data.
//!
//! `LaunchFeed` owns the most recent payload fetched from a `LaunchSource`.
//! It is populated by the startup sync, refreshed by the scheduler and the
//! manual trigger, and read by the HTTP handlers.

mod error;
mod parse;
mod spacex;

pub use error::FetchError;
pub use parse::{parse_mission_data, RawMission};
pub use spacex::SpaceXClient;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Anything that can produce the current list of raw launch objects.
#[async_trait]
pub trait LaunchSource: Send + Sync {
    async fn fetch_launches(&self) -> Result<Vec<Value>, FetchError>;
}

/// Cache of the latest launch payload.
pub struct LaunchFeed {
    source: Arc<dyn LaunchSource>,
    latest: RwLock<Option<Vec<Value>>>,
}

pub type SharedLaunchFeed = Arc<LaunchFeed>;

impl LaunchFeed {
    pub fn new(source: Arc<dyn LaunchSource>) -> Self {
        Self {
            source,
            latest: RwLock::new(None),
        }
    }

    /// Fetch from the source and replace the cached payload.
    ///
    /// On failure the previous payload is kept.
    pub async fn refresh(&self) -> Result<usize, FetchError> {
        let launches = self.source.fetch_launches().await?;
        let count = launches.len();
        *self.latest.write().await = Some(launches);
        tracing::debug!("Launch feed refreshed with {} launches", count);
        Ok(count)
    }

    /// The cached payload, or `None` if nothing (or an empty list) has been fetched.
    pub async fn current(&self) -> Option<Vec<Value>> {
        self.latest
            .read()
            .await
            .as_ref()
            .filter(|launches| !launches.is_empty())
            .cloned()
    }

    /// The cached payload converted into mission mappings.
    pub async fn current_missions(&self) -> Option<Vec<RawMission>> {
        let latest = self.latest.read().await;
        latest
            .as_ref()
            .filter(|launches| !launches.is_empty())
            .map(|launches| parse_mission_data(launches))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticLaunchSource;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_feed_is_empty_before_first_refresh() {
        let feed = LaunchFeed::new(StaticLaunchSource::new(Some(vec![json!({"name": "A"})])));
        assert!(feed.current().await.is_none());
        assert!(feed.current_missions().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_populates_cache() {
        let source = StaticLaunchSource::new(Some(vec![
            json!({"name": "FalconSat", "success": false}),
            json!({"name": "DemoSat", "success": true}),
        ]));
        let feed = LaunchFeed::new(source.clone());

        assert_eq!(feed.refresh().await.unwrap(), 2);
        assert_eq!(source.calls(), 1);
        assert_eq!(feed.current().await.unwrap().len(), 2);

        let missions = feed.current_missions().await.unwrap();
        assert_eq!(missions[1]["status"], "completed");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_payload() {
        let source = StaticLaunchSource::new(Some(vec![json!({"name": "FalconSat"})]));
        let feed = LaunchFeed::new(source.clone());
        feed.refresh().await.unwrap();

        source.set(None);
        let err = feed.refresh().await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(feed.current().await.unwrap()[0]["name"], "FalconSat");
    }

    #[tokio::test]
    async fn test_empty_payload_counts_as_no_data() {
        let feed = LaunchFeed::new(StaticLaunchSource::new(Some(vec![])));
        assert_eq!(feed.refresh().await.unwrap(), 0);
        assert!(feed.current().await.is_none());
    }
}
