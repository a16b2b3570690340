//! HTTP client implementation

use std::time::Duration;

use openapi_client::models::ErrorResponse;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::ConnectError;
use crate::settings::Settings;
use crate::utils::user_agent;

/// HTTP client bound to one API endpoint and API key
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    upload_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from resolved settings
    pub fn new(settings: &Settings) -> Result<Self, ConnectError> {
        let mut auth = header::HeaderValue::from_str(&settings.authorization())
            .map_err(|_| ConnectError::Config("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(user_agent())
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(settings.api_endpoint().trim_end_matches('/'))
            .map_err(|e| ConnectError::Config(format!("invalid API endpoint: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConnectError::Config(format!(
                "API endpoint '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            upload_timeout: settings.upload_timeout,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Timeout applied to bundle uploads instead of the request timeout
    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Endpoint URL for `segments`, each percent-encoded as one path segment
    ///
    /// Empty, `.` and `..` segments are rejected since they would address a
    /// different resource.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ConnectError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ConnectError::Validation(format!(
                "invalid path segment '{}'",
                bad
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectError::Config("API endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ConnectError> {
        self.get_with_query(segments, &[]).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ConnectError> {
        let mut url = self.url(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let request = self.client.get(url.clone());
        let response = self.send(Method::GET, &url, request).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ConnectError> {
        let url = self.url(segments)?;
        let request = self.client.post(url.clone()).json(body);
        let response = self.send(Method::POST, &url, request).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request with a raw binary body, under the upload timeout
    pub async fn post_bytes<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        bytes: Vec<u8>,
    ) -> Result<T, ConnectError> {
        let url = self.url(segments)?;
        let request = self
            .client
            .post(url.clone())
            .timeout(self.upload_timeout)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        let response = self.send(Method::POST, &url, request).await?;
        Ok(response.json().await?)
    }

    /// Make a PATCH request
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ConnectError> {
        let url = self.url(segments)?;
        let request = self.client.patch(url.clone()).json(body);
        let response = self.send(Method::PATCH, &url, request).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request, discarding any response body
    pub async fn delete(&self, segments: &[&str]) -> Result<(), ConnectError> {
        let url = self.url(segments)?;
        let request = self.client.delete(url.clone());
        self.send(Method::DELETE, &url, request).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<Response, ConnectError> {
        debug!("{} {}", method, url);

        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("HTTP {} {} failed: {} - {}", method, url.path(), status, body);

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        Err(ConnectError::Http {
            status: status.as_u16(),
            message,
            body,
        })
    }
}
