//! Finite State Machine for content deployment

use serde::{Deserialize, Serialize};

use crate::errors::ConnectError;

/// Deployment state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    /// Content exists, no bundle uploaded yet
    Created,

    /// Bundle upload in progress
    Uploading,

    /// Bundle accepted, bundle id known
    Uploaded,

    /// Deploy triggered, task id known
    Deploying,

    /// Task finished without error
    Finished,

    /// Task finished with an error
    Failed,
}

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// Start uploading the bundle
    Upload,

    /// Server accepted the bundle
    UploadAccepted(String),

    /// Server started a deployment task
    DeployTriggered(String),

    /// Task reported completion
    TaskFinished,

    /// Deployment failed
    Failed(String),
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentState,
    bundle_id: Option<String>,
    task_id: Option<String>,
    error: Option<String>,
}

impl DeploymentFsm {
    /// Create a new FSM in created state
    pub fn new() -> Self {
        Self {
            state: DeploymentState::Created,
            bundle_id: None,
            task_id: None,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &DeploymentState {
        &self.state
    }

    /// Bundle id, once uploaded
    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    /// Task id, once deploying
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True in `Finished` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, DeploymentState::Finished | DeploymentState::Failed)
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), ConnectError> {
        let new_state = match (&self.state, event) {
            (DeploymentState::Created, DeploymentEvent::Upload) => DeploymentState::Uploading,

            (DeploymentState::Uploading, DeploymentEvent::UploadAccepted(bundle_id)) => {
                self.bundle_id = Some(bundle_id);
                DeploymentState::Uploaded
            }

            (DeploymentState::Uploaded, DeploymentEvent::DeployTriggered(task_id)) => {
                self.task_id = Some(task_id);
                DeploymentState::Deploying
            }

            (DeploymentState::Deploying, DeploymentEvent::TaskFinished) => DeploymentState::Finished,

            (state, DeploymentEvent::Failed(err))
                if !matches!(state, DeploymentState::Finished | DeploymentState::Failed) =>
            {
                self.error = Some(err);
                DeploymentState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(ConnectError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
