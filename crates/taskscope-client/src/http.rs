//! HTTP client for the gateway's REST endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use taskscope_core::{TaskId, TaskStatus, TaskSummary};

use crate::api::{TaskApi, TaskListResponse, TaskSnapshot};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// HTTP client for REST API endpoints.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Create a client honoring the configured request timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if the gateway is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking health");

        let response = self.inner.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Get JSON from an endpoint.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ClientError::from_response_parts(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl TaskApi for HttpClient {
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<TaskSummary>, ClientError> {
        let query: Vec<(&str, &str)> = status.iter().map(|s| ("status", s.as_str())).collect();
        let response: TaskListResponse = self.get_json("/api/tasks", &query).await?;
        debug!(count = response.tasks.len(), "Fetched tasks");
        Ok(response.tasks)
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<TaskSnapshot, ClientError> {
        let path = format!("/api/tasks/{}", task_id);
        let snapshot: TaskSnapshot = self.get_json(&path, &[]).await?;
        debug!(
            task_id = %task_id,
            status = %snapshot.task.status,
            events = snapshot.events.len(),
            artifacts = snapshot.artifacts.len(),
            "Fetched task snapshot"
        );
        Ok(snapshot)
    }
}
