//! Client configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Default REST endpoint of the backend.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Top-level configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is joined onto.
    pub api_url: String,
    /// Maximum time to wait for a single HTTP request.
    pub request_timeout: Duration,
    /// Period of the request board's polling. Zero disables polling.
    pub poll_interval: Duration,
    /// File the session is persisted to. `None` keeps it in memory.
    pub session_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            session_path: None,
        }
    }
}
