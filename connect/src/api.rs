//! Connect API context
//!
//! [`ConnectClient`] owns resolved settings and one transport. Create one
//! explicitly and pass it where it is needed; there is no global client.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use openapi_client::models::ContentListQuery;
use tracing::info;

use crate::bundle::Bundle;
use crate::deploy::poller::{self, PollOptions};
use crate::deploy::workflow::{self, DeployOptions, Deployment};
use crate::errors::ConnectError;
use crate::http::client::HttpClient;
use crate::models::content::{Content, ContentFilter, ContentUpdate, ContentUrls, NewContent};
use crate::models::task::DeploymentTask;
use crate::models::user::User;
use crate::settings::{Settings, SettingsInput};

/// Client for one Connect server
#[derive(Debug, Clone)]
pub struct ConnectClient {
    settings: Settings,
    http: HttpClient,
}

impl ConnectClient {
    /// Create a client from resolved settings
    pub fn new(settings: Settings) -> Result<Self, ConnectError> {
        let http = HttpClient::new(&settings)?;
        Ok(Self { settings, http })
    }

    /// Create a client from `CONNECT_SERVER`, `CONNECT_API_KEY` and `API_ENDPOINT`
    pub fn from_env() -> Result<Self, ConnectError> {
        Self::new(Settings::resolve(SettingsInput::default())?)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Underlying transport
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The user owning the API key
    pub async fn current_user(&self) -> Result<User, ConnectError> {
        self.http.current_user().await
    }

    /// Content visible to the caller, optionally filtered
    pub async fn list_content(&self, filter: &ContentFilter) -> Result<Vec<Content>, ConnectError> {
        self.http.list_content(&ContentListQuery::from(filter)).await
    }

    /// Content owned by the current user
    pub async fn my_content(&self) -> Result<Vec<Content>, ConnectError> {
        let user = self.current_user().await?;
        self.list_content(&ContentFilter::owned_by(user.guid)).await
    }

    pub async fn create_content(&self, content: &NewContent) -> Result<Content, ConnectError> {
        let created = self.http.create_content(content).await?;
        info!("Created content {} ({:?})", created.guid, created.title);
        Ok(created)
    }

    pub async fn get_content(&self, guid: &str) -> Result<Content, ConnectError> {
        self.http.get_content(guid).await
    }

    /// Send the set fields of `update`; an empty update is rejected locally
    pub async fn update_content(
        &self,
        guid: &str,
        update: &ContentUpdate,
    ) -> Result<Content, ConnectError> {
        if update.is_empty() {
            return Err(ConnectError::Validation(format!(
                "update for {} sets no fields",
                guid
            )));
        }
        self.http.update_content(guid, update).await
    }

    pub async fn delete_content(&self, guid: &str) -> Result<(), ConnectError> {
        self.http.delete_content(guid).await?;
        info!("Deleted content {}", guid);
        Ok(())
    }

    /// Dashboard and solo URLs, computed without a request
    pub fn content_urls(&self, guid: &str) -> ContentUrls {
        ContentUrls::new(self.settings.server(), guid)
    }

    /// Upload a packaged bundle and return the new bundle id
    pub async fn upload_bundle(&self, guid: &str, bundle: &Bundle) -> Result<String, ConnectError> {
        let archive = bundle.read().await?;
        Ok(self.http.upload_bundle(guid, archive).await?.bundle_id)
    }

    /// Start deploying an uploaded bundle and return the task id
    pub async fn trigger_deploy(&self, guid: &str, bundle_id: &str) -> Result<String, ConnectError> {
        Ok(self.http.deploy_bundle(guid, bundle_id).await?.task_id)
    }

    /// Current snapshot of a task
    pub async fn get_task(&self, task_id: &str) -> Result<DeploymentTask, ConnectError> {
        let response = self.http.get_task(task_id).await?;
        Ok(DeploymentTask::from_response(task_id, response))
    }

    /// Wait for a task to finish, streaming new log lines to `on_output`
    pub async fn poll_task<O>(
        &self,
        task_id: &str,
        options: &PollOptions,
        on_output: O,
    ) -> Result<DeploymentTask, ConnectError>
    where
        O: FnMut(&str),
    {
        poller::poll_task(&self.http, task_id, options, tokio::time::sleep, on_output).await
    }

    /// Package, upload and deploy `dir` to content `guid`, then wait
    pub async fn deploy<O>(
        &self,
        guid: &str,
        dir: &Path,
        options: &DeployOptions,
        on_output: O,
    ) -> Result<Deployment, ConnectError>
    where
        O: FnMut(&str),
    {
        self.deploy_with(guid, dir, options, tokio::time::sleep, on_output)
            .await
    }

    /// Like [`ConnectClient::deploy`] with a custom sleep between polls
    pub async fn deploy_with<S, F, O>(
        &self,
        guid: &str,
        dir: &Path,
        options: &DeployOptions,
        sleep_fn: S,
        on_output: O,
    ) -> Result<Deployment, ConnectError>
    where
        S: Fn(Duration) -> F,
        F: Future<Output = ()>,
        O: FnMut(&str),
    {
        workflow::deploy_directory(
            &self.http,
            self.settings.server(),
            guid,
            dir,
            options,
            sleep_fn,
            on_output,
        )
        .await
    }
}
