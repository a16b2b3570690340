//! Bundle upload, deploy and task API client

use openapi_client::models::{DeployRequest, DeployResponse, TaskResponse, UploadResponse};

use crate::errors::ConnectError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Upload a bundle archive for a content item
    pub async fn upload_bundle(
        &self,
        guid: &str,
        archive: Vec<u8>,
    ) -> Result<UploadResponse, ConnectError> {
        self.post_bytes(&["content", guid, "upload"], archive).await
    }

    /// Start deploying an uploaded bundle
    pub async fn deploy_bundle(
        &self,
        guid: &str,
        bundle_id: &str,
    ) -> Result<DeployResponse, ConnectError> {
        let body = DeployRequest {
            bundle_id: bundle_id.to_string(),
        };
        self.post(&["content", guid, "deploy"], &body).await
    }

    /// Get the status and cumulative output of a task
    pub async fn get_task(&self, task_id: &str) -> Result<TaskResponse, ConnectError> {
        self.get(&["tasks", task_id]).await
    }
}
