//! Connection settings resolution
//!
//! Every value comes from an explicit argument first, then from the
//! environment, then (for the API endpoint only) from a computed default.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::errors::ConnectError;

/// Environment variable holding the server URL
pub const SERVER_ENV: &str = "CONNECT_SERVER";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "CONNECT_API_KEY";

/// Environment variable overriding the computed API endpoint
pub const API_ENDPOINT_ENV: &str = "API_ENDPOINT";

/// Path appended to the server URL to reach the v1 API
pub const API_PATH: &str = "__api__/v1";

/// Default timeout for ordinary API requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for bundle uploads
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Unresolved settings, as given by a caller or the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsInput {
    /// Server URL, e.g. `https://connect.example.com/rsc`
    pub server: Option<String>,

    /// API key
    pub api_key: Option<String>,

    /// Explicit API endpoint, bypassing `{server}/__api__/v1`
    pub api_endpoint: Option<String>,
}

/// Resolved and validated settings
pub struct Settings {
    server: String,
    api_key: SecretString,
    api_endpoint: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Timeout for bundle uploads, which may carry large archives
    pub upload_timeout: Duration,
}

impl Settings {
    /// Resolve settings against the process environment
    pub fn resolve(input: SettingsInput) -> Result<Self, ConnectError> {
        Self::resolve_with(input, |key| std::env::var(key).ok())
    }

    /// Resolve settings with a custom environment lookup
    pub fn resolve_with<F>(input: SettingsInput, lookup: F) -> Result<Self, ConnectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = input
            .server
            .or_else(|| lookup(SERVER_ENV))
            .ok_or_else(|| {
                ConnectError::Config(format!("server URL not set (pass it or set {SERVER_ENV})"))
            })?;
        let server = normalize_server(&server)?;

        let api_key = input
            .api_key
            .or_else(|| lookup(API_KEY_ENV))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ConnectError::Config(format!("API key not set (pass it or set {API_KEY_ENV})"))
            })?;

        let api_endpoint = match input.api_endpoint.or_else(|| lookup(API_ENDPOINT_ENV)) {
            Some(endpoint) => normalize_endpoint(&endpoint)?,
            None => format!("{}/{}", server, API_PATH),
        };

        Ok(Self {
            server,
            api_key: SecretString::from(api_key),
            api_endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        })
    }

    /// Server URL without a trailing slash
    pub fn server(&self) -> &str {
        &self.server
    }

    /// API endpoint without a trailing slash
    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Key {}", self.api_key.expose_secret())
    }
}

impl Clone for Settings {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            api_key: SecretString::from(self.api_key.expose_secret().to_string()),
            api_endpoint: self.api_endpoint.clone(),
            request_timeout: self.request_timeout,
            upload_timeout: self.upload_timeout,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("server", &self.server)
            .field("api_key", &self.api_key)
            .field("api_endpoint", &self.api_endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}

fn normalize_server(raw: &str) -> Result<String, ConnectError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConnectError::Config("server URL is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| ConnectError::Config(format!("invalid server URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConnectError::Config(format!(
            "server URL must be an absolute http(s) URL, got '{}'",
            raw
        )));
    }

    Ok(trimmed.to_string())
}

fn normalize_endpoint(raw: &str) -> Result<String, ConnectError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| ConnectError::Config(format!("invalid API endpoint '{}': {}", raw, e)))?;
    Ok(trimmed.to_string())
}
