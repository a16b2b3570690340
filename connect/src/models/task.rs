//! Deployment task models

use openapi_client::models::TaskResponse;
use serde::{Deserialize, Serialize};

/// Snapshot of a server-side deployment task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTask {
    pub task_id: String,

    /// Cumulative log lines since the task started
    pub output: Vec<String>,

    pub finished: bool,

    /// Exit code reported by the server once finished
    pub code: i64,

    /// Error reported by the server, if the task failed
    pub error: Option<String>,
}

impl DeploymentTask {
    /// Build a task snapshot from a wire response
    pub fn from_response(task_id: &str, response: TaskResponse) -> Self {
        let task_id = if response.id.is_empty() {
            task_id.to_string()
        } else {
            response.id
        };
        let error = Some(response.error).filter(|e| !e.trim().is_empty());

        Self {
            task_id,
            output: response.output,
            finished: response.finished,
            code: response.code,
            error,
        }
    }

    /// True once the task finished with a reported error
    pub fn is_failed(&self) -> bool {
        self.finished && self.error.is_some()
    }
}
