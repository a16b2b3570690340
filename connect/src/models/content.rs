//! Content models

use chrono::{DateTime, Utc};
use openapi_client::models::ContentListQuery;
use serde::{Deserialize, Serialize};

/// Default access type for new content
pub const DEFAULT_ACCESS_TYPE: &str = "acl";

/// A content item as stored on the server
///
/// Fields not listed in [`Content::EDITABLE_FIELDS`] are assigned by the
/// server and are never sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub guid: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,

    /// One of `all`, `logged_in`, `acl`
    pub access_type: Option<String>,

    pub connection_timeout: Option<i32>,
    pub read_timeout: Option<i32>,
    pub init_timeout: Option<i32>,
    pub idle_timeout: Option<i32>,
    pub max_processes: Option<i32>,
    pub min_processes: Option<i32>,
    pub max_conns_per_process: Option<i32>,
    pub load_factor: Option<f64>,

    pub created_time: Option<DateTime<Utc>>,
    pub last_deployed_time: Option<DateTime<Utc>>,

    /// Active bundle, set by the server after a successful deployment
    pub bundle_id: Option<String>,

    /// Runtime model (`shiny`, `rmd-static`, `unknown`, ...)
    pub app_mode: Option<String>,
    pub content_category: Option<String>,
    pub parameterized: Option<bool>,
    pub cluster_name: Option<String>,
    pub image_name: Option<String>,
    pub r_version: Option<String>,
    pub py_version: Option<String>,
    pub quarto_version: Option<String>,
    pub run_as: Option<String>,
    #[serde(default)]
    pub run_as_current_user: bool,
    pub owner_guid: Option<String>,
    pub content_url: Option<String>,
    pub dashboard_url: Option<String>,

    /// Relationship of the caller to this item: `owner`, `editor`, `viewer`, `none`
    pub role: Option<String>,
    pub id: Option<String>,
}

impl Content {
    /// Fields a client may change through `PATCH /content/{guid}`
    pub const EDITABLE_FIELDS: [&'static str; 14] = [
        "name",
        "title",
        "description",
        "access_type",
        "connection_timeout",
        "read_timeout",
        "init_timeout",
        "idle_timeout",
        "max_processes",
        "min_processes",
        "max_conns_per_process",
        "load_factor",
        "run_as",
        "run_as_current_user",
    ];

    /// Current editable values, ready to send back after local edits
    pub fn to_update(&self) -> ContentUpdate {
        ContentUpdate {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            access_type: self.access_type.clone(),
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
            init_timeout: self.init_timeout,
            idle_timeout: self.idle_timeout,
            max_processes: self.max_processes,
            min_processes: self.min_processes,
            max_conns_per_process: self.max_conns_per_process,
            load_factor: self.load_factor,
            run_as: self.run_as.clone(),
            run_as_current_user: Some(self.run_as_current_user),
        }
    }

    /// Apply the set fields of an update, leaving the others unchanged
    pub fn apply_update(&mut self, update: &ContentUpdate) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut self.name, &update.name);
        set(&mut self.title, &update.title);
        set(&mut self.description, &update.description);
        set(&mut self.access_type, &update.access_type);
        set(&mut self.connection_timeout, &update.connection_timeout);
        set(&mut self.read_timeout, &update.read_timeout);
        set(&mut self.init_timeout, &update.init_timeout);
        set(&mut self.idle_timeout, &update.idle_timeout);
        set(&mut self.max_processes, &update.max_processes);
        set(&mut self.min_processes, &update.min_processes);
        set(&mut self.max_conns_per_process, &update.max_conns_per_process);
        set(&mut self.load_factor, &update.load_factor);
        set(&mut self.run_as, &update.run_as);
        if let Some(v) = update.run_as_current_user {
            self.run_as_current_user = v;
        }
    }
}

/// Payload for `POST /content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_processes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conns_per_process: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as: Option<String>,
    #[serde(default)]
    pub run_as_current_user: bool,
}

impl NewContent {
    /// New content with only a title; the server generates the name
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            name: None,
            description: None,
            access_type: Some(DEFAULT_ACCESS_TYPE.to_string()),
            connection_timeout: None,
            read_timeout: None,
            init_timeout: None,
            idle_timeout: None,
            max_processes: None,
            min_processes: None,
            max_conns_per_process: None,
            load_factor: None,
            run_as: None,
            run_as_current_user: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_processes(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_processes = min;
        self.max_processes = max;
        self
    }
}

/// Partial update for `PATCH /content/{guid}`
///
/// Only fields that are `Some` go on the wire; a missing field means
/// "leave unchanged". Clearing a field is not expressible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_processes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conns_per_process: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as_current_user: Option<bool>,
}

impl ContentUpdate {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self == &ContentUpdate::default()
    }
}

/// Filters for listing content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub owner_guid: Option<String>,
    pub name: Option<String>,
}

impl ContentFilter {
    pub fn owned_by(owner_guid: impl Into<String>) -> Self {
        Self {
            owner_guid: Some(owner_guid.into()),
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&ContentFilter> for ContentListQuery {
    fn from(filter: &ContentFilter) -> Self {
        ContentListQuery {
            owner_guid: filter.owner_guid.clone(),
            name: filter.name.clone(),
        }
    }
}

/// Browser URLs for a content item, derived from the server and guid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUrls {
    /// Management view inside the dashboard
    pub dashboard_url: String,

    /// Solo view of the content itself
    pub content_url: String,
}

impl ContentUrls {
    pub fn new(server: &str, guid: &str) -> Self {
        let server = server.trim_end_matches('/');
        Self {
            dashboard_url: format!("{}/connect/#/apps/{}", server, guid),
            content_url: format!("{}/content/{}/", server, guid),
        }
    }
}
