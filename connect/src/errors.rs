//! Error types for the Connect client

use thiserror::Error;

/// Main error type for the Connect client
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Deployment task {task_id} did not finish after {polls} polls")]
    DeployTimeout { task_id: String, polls: u32 },
}

impl ConnectError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectError::Http { status, .. } => Some(*status),
            ConnectError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 4xx responses
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }
}
