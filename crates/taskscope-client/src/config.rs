//! Client configuration.

use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL, without trailing slash.
    pub base_url: String,

    /// Timeout for snapshot and list requests. Not applied to the push stream.
    pub request_timeout: Duration,

    /// Delay before the push transport reconnects after a network error,
    /// until the server overrides it with a `retry:` field.
    pub reconnect_delay: Duration,

    /// How often the task list is refreshed while it is on screen.
    pub list_refresh: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(3),
            list_refresh: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Builder method to set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
