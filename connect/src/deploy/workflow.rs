//! Bundle, upload, deploy and wait

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::bundle::{Bundle, BundleOptions};
use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
use crate::deploy::poller::{poll_task, PollOptions};
use crate::errors::ConnectError;
use crate::http::client::HttpClient;
use crate::models::content::ContentUrls;
use crate::models::task::DeploymentTask;
use crate::utils::sha256_hash;

/// Deployment options
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub bundle: BundleOptions,
    pub poll: PollOptions,

    /// Leave the generated archive in the content directory
    pub keep_bundle: bool,
}

/// Outcome of a deployment that ran to completion
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub content_guid: String,
    pub bundle_id: String,
    pub bundle_sha256: String,

    /// Archive path, when kept
    pub bundle_path: Option<PathBuf>,

    pub task: DeploymentTask,

    /// `Finished`, or `Failed` when the task reported an error
    pub state: DeploymentState,

    pub urls: ContentUrls,
}

/// Package `dir`, upload it to content `guid`, deploy it and wait for the task
///
/// A missing manifest or an empty poll budget fails before any request is
/// made. Transport errors at any step abort the deployment as is.
pub async fn deploy_directory<S, F, O>(
    http: &HttpClient,
    server: &str,
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
    options.poll.validate()?;
    let mut fsm = DeploymentFsm::new();
    let bundle = Bundle::create(dir, &options.bundle)?;

    fsm.process(DeploymentEvent::Upload)?;
    let archive = bundle.read().await?;
    let bundle_sha256 = sha256_hash(&archive);
    info!(
        "Uploading bundle for {} ({} bytes, sha256 {})",
        guid,
        archive.len(),
        bundle_sha256
    );
    let upload = http.upload_bundle(guid, archive).await?;
    fsm.process(DeploymentEvent::UploadAccepted(upload.bundle_id.clone()))?;

    let bundle_path = if options.keep_bundle {
        Some(bundle.persist())
    } else {
        drop(bundle);
        None
    };

    let deploy = http.deploy_bundle(guid, &upload.bundle_id).await?;
    info!("Deploying bundle {} for {} as task {}", upload.bundle_id, guid, deploy.task_id);
    fsm.process(DeploymentEvent::DeployTriggered(deploy.task_id.clone()))?;

    let task = poll_task(http, &deploy.task_id, &options.poll, sleep_fn, on_output).await?;
    match &task.error {
        Some(err) => fsm.process(DeploymentEvent::Failed(err.clone()))?,
        None => fsm.process(DeploymentEvent::TaskFinished)?,
    }
    info!("Deployment of {} ended in state {:?}", guid, fsm.state());

    Ok(Deployment {
        content_guid: guid.to_string(),
        bundle_id: upload.bundle_id,
        bundle_sha256,
        bundle_path,
        task,
        state: fsm.state().clone(),
        urls: ContentUrls::new(server, guid),
    })
}
