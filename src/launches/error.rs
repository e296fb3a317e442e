//! Launch feed error types.
//!
//! Separates connection failures from bad responses so the sync triggers can
//! log them distinctly.

use thiserror::Error;

/// Error from fetching the external launch feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connect failure, timeout, or the request never produced a response
    #[error("Connection to launch API failed: {0}")]
    Connection(String),

    /// The API answered with a non-success status
    #[error("Launch API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON array
    #[error("Invalid launch payload: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether the API could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Connection(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::Connection(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Connection(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_classification() {
        assert!(FetchError::Connection("refused".to_string()).is_connection());
        assert!(!FetchError::Parse("not json".to_string()).is_connection());
        assert!(!FetchError::Status {
            status: 503,
            body: String::new()
        }
        .is_connection());
    }

    #[test]
    fn test_status_message() {
        let err = FetchError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Launch API returned HTTP 502: bad gateway");
    }
}
