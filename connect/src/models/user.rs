//! User models

use chrono::{DateTime, Utc};
use openapi_client::models::null_as_default;
use serde::{Deserialize, Serialize};

/// A Connect user account, as returned by `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub email: String,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,

    /// One of `viewer`, `publisher`, `administrator`
    pub user_role: String,

    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,

    /// Null until the user has logged in at least once
    pub active_time: Option<DateTime<Utc>>,

    pub confirmed: bool,
    pub locked: bool,
}

impl User {
    /// First and last name joined, falling back to the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
