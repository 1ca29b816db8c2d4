//! HTTP client for the platform backend.
//!
//! Every query is independent and idempotent: a fetch returns a whole
//! snapshot that fully replaces the previous one, never a partial patch.
//! The `SnapshotSource` trait is the seam the polling loops consume, so
//! tests can drive them with canned snapshots instead of a live backend.

use crate::errors::ClientError;
use crate::hook::HookSnapshot;
use crate::poll::DeploymentStatus;
use crate::stage::StageStatusResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Largest hook snapshot requested per poll.
pub const DEFAULT_HOOK_LIMIT: u32 = 100;

/// Summary of a task, enough to pick the deployment poll cadence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub deployment_status: Option<String>,
}

impl TaskSummary {
    /// Lenient view of the backend's deployment status token.
    pub fn deployment_status(&self) -> DeploymentStatus {
        self.deployment_status
            .as_deref()
            .map(DeploymentStatus::parse_lenient)
            .unwrap_or(DeploymentStatus::Pending)
    }
}

/// Read-side queries the polling loops depend on.
#[async_trait]
pub trait SnapshotSource {
    async fn task(&self, task_id: &str) -> Result<TaskSummary, ClientError>;

    async fn deployment_hooks(
        &self,
        task_id: &str,
        limit: u32,
    ) -> Result<HookSnapshot, ClientError>;

    async fn session_hooks(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<HookSnapshot, ClientError>;

    async fn stage_status(
        &self,
        project_id: &str,
        issue_id: &str,
    ) -> Result<StageStatusResponse, ClientError>;
}

/// reqwest-backed client for the platform API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ClientError> {
        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }

        response
            .json()
            .await
            .map_err(|source| ClientError::Decode { url, source })
    }

    /// Ask the backend to retry the current stage of an issue resolution.
    ///
    /// The stage machine itself never retries; it only reflects the
    /// document's `retry_count`/`error_message` afterwards.
    pub async fn retry_stage(&self, project_id: &str, issue_id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!(
            "/api/projects/{}/issues/{}/retry-stage",
            project_id, issue_id
        ));

        let mut request = self.http.post(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn task(&self, task_id: &str) -> Result<TaskSummary, ClientError> {
        self.get_json(self.url(&format!("/api/tasks/{}", task_id)))
            .await
    }

    async fn deployment_hooks(
        &self,
        task_id: &str,
        limit: u32,
    ) -> Result<HookSnapshot, ClientError> {
        self.get_json(self.url(&format!("/api/tasks/{}/hooks?limit={}", task_id, limit)))
            .await
    }

    async fn session_hooks(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<HookSnapshot, ClientError> {
        self.get_json(self.url(&format!("/api/sessions/{}/hooks?limit={}", session_id, limit)))
            .await
    }

    async fn stage_status(
        &self,
        project_id: &str,
        issue_id: &str,
    ) -> Result<StageStatusResponse, ClientError> {
        self.get_json(self.url(&format!(
            "/api/projects/{}/issues/{}/stage-status",
            project_id, issue_id
        )))
        .await
    }
}
