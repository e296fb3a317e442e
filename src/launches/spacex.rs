//! SpaceX REST API client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::error::FetchError;
use super::LaunchSource;

/// Fetches the full launch list from the SpaceX v4 API (or a compatible endpoint).
pub struct SpaceXClient {
    client: Client,
    url: String,
}

impl SpaceXClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("space-nomad/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LaunchSource for SpaceXClient {
    async fn fetch_launches(&self) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(launches)) => Ok(launches),
            Ok(other) => Err(FetchError::Parse(format!(
                "expected a JSON array of launches, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(FetchError::Parse(e.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
