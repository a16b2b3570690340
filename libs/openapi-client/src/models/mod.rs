//! API models

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a missing or `null` value as `T::default()`
///
/// Use together with `#[serde(default)]` so both an absent key and an
/// explicit `null` are accepted.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query parameters for `GET /content`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ContentListQuery {
    /// Key/value pairs for the parameters that are set, in a stable order
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(owner_guid) = &self.owner_guid {
            pairs.push(("owner_guid", owner_guid.as_str()));
        }
        if let Some(name) = &self.name {
            pairs.push(("name", name.as_str()));
        }
        pairs
    }
}

/// Response to `POST /content/{guid}/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub bundle_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_size: Option<u64>,
}

/// Body of `POST /content/{guid}/deploy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub bundle_id: String,
}

/// Response to `POST /content/{guid}/deploy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    pub task_id: String,
}

/// Response to `GET /tasks/{task_id}`
///
/// `output` is always the cumulative log of the task, not a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub output: Vec<String>,

    pub finished: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub code: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: i64,

    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}
