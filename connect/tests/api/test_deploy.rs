//! Deployment workflow tests

use std::fs;
use std::future;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use connectapi::deploy::{DeployOptions, DeploymentState, PollOptions};
use connectapi::models::{Content, NewContent};
use connectapi::ConnectError;
use flate2::read::GzDecoder;
use axum::http::StatusCode;
use tempfile::TempDir;

use crate::fake_server::{task, FakeConnect};

fn content_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("manifest.json"), r#"{"version": 1}"#).unwrap();
    fs::write(dir.path().join("app.R"), "shiny::runApp()\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a source\n").unwrap();
    dir
}

fn leftover_bundles(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("bundle-") && name.ends_with(".tar.gz"))
        .collect()
}

fn archive_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn create(server: &FakeConnect) -> Content {
    server
        .client()
        .create_content(&NewContent::new("App"))
        .await
        .unwrap()
}

fn fast_polls(max_polls: u32) -> DeployOptions {
    DeployOptions {
        poll: PollOptions {
            interval: std::time::Duration::from_millis(1),
            max_polls,
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_deploy_streams_each_line_once() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    server.state.lock().unwrap().task_script = vec![
        task(&["a"], false),
        task(&["a"], false),
        task(&["a", "b"], false),
        task(&["a", "b", "c"], true),
    ];
    let dir = content_dir();

    let sleeps = AtomicU32::new(0);
    let mut lines = Vec::new();
    let deployment = server
        .client()
        .deploy_with(
            &content.guid,
            dir.path(),
            &fast_polls(10),
            |_| {
                sleeps.fetch_add(1, Ordering::SeqCst);
                future::ready(())
            },
            |line| lines.push(line.to_string()),
        )
        .await
        .unwrap();

    assert_eq!(lines, vec!["a", "b", "c"]);
    assert_eq!(sleeps.load(Ordering::SeqCst), 3);
    assert_eq!(deployment.state, DeploymentState::Finished);
    assert_eq!(deployment.task.task_id, "task-1");
    assert!(deployment.task.finished);
    assert_eq!(deployment.bundle_id, "b-1");
    assert_eq!(deployment.bundle_sha256.len(), 64);
    assert!(deployment.bundle_path.is_none());
    assert_eq!(
        deployment.urls.content_url,
        format!("http://{}/content/{}/", server.addr, content.guid)
    );

    let state = server.state.lock().unwrap();
    assert_eq!(state.uploads.len(), 1);
    assert_eq!(state.uploads[0].0, content.guid);
    assert_eq!(archive_names(&state.uploads[0].1), vec!["app.R", "manifest.json"]);
    assert_eq!(state.deploys, vec![(content.guid.clone(), "b-1".to_string())]);
    drop(state);

    assert!(leftover_bundles(dir.path()).is_empty());
}

#[tokio::test]
async fn test_deploy_times_out_when_task_never_finishes() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    server.state.lock().unwrap().task_script = vec![task(&["waiting"], false)];
    let dir = content_dir();

    let mut lines = Vec::new();
    let err = server
        .client()
        .deploy_with(
            &content.guid,
            dir.path(),
            &fast_polls(4),
            |_| future::ready(()),
            |line| lines.push(line.to_string()),
        )
        .await
        .unwrap_err();

    match err {
        ConnectError::DeployTimeout { task_id, polls } => {
            assert_eq!(task_id, "task-1");
            assert_eq!(polls, 4);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(lines, vec!["waiting"]);
    assert_eq!(server.state.lock().unwrap().task_polls, 4);
}

#[tokio::test]
async fn test_deploy_without_manifest_makes_no_request() {
    let server = FakeConnect::start().await;
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.R"), "1\n").unwrap();

    let err = server
        .client()
        .deploy_with("any", dir.path(), &fast_polls(1), |_| future::ready(()), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::Validation(_)));
    assert!(server.requests().is_empty());
    assert!(leftover_bundles(dir.path()).is_empty());
}

#[tokio::test]
async fn test_task_error_marks_deployment_failed() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    let mut failed = task(&["Installing packages", "Error: package not found"], true);
    failed.code = 1;
    failed.error = "package not found".to_string();
    server.state.lock().unwrap().task_script = vec![failed];
    let dir = content_dir();

    let deployment = server
        .client()
        .deploy_with(&content.guid, dir.path(), &fast_polls(3), |_| future::ready(()), |_| {})
        .await
        .unwrap();

    assert_eq!(deployment.state, DeploymentState::Failed);
    assert_eq!(deployment.task.error.as_deref(), Some("package not found"));
    assert_eq!(deployment.task.code, 1);
    assert!(deployment.task.is_failed());
}

#[tokio::test]
async fn test_upload_to_unknown_content_fails() {
    let server = FakeConnect::start().await;
    let dir = content_dir();

    let err = server
        .client()
        .deploy_with("missing", dir.path(), &fast_polls(3), |_| future::ready(()), |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(server.state.lock().unwrap().deploys.is_empty());
    assert!(leftover_bundles(dir.path()).is_empty());
}

#[tokio::test]
async fn test_keep_bundle_leaves_archive() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    let dir = content_dir();
    let mut options = fast_polls(3);
    options.keep_bundle = true;

    let deployment = server
        .client()
        .deploy_with(&content.guid, dir.path(), &options, |_| future::ready(()), |_| {})
        .await
        .unwrap();

    let kept = deployment.bundle_path.expect("bundle path");
    assert!(kept.is_file());
    let mut bytes = Vec::new();
    fs::File::open(&kept).unwrap().read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, server.state.lock().unwrap().uploads[0].1);
    assert_eq!(leftover_bundles(dir.path()).len(), 1);
}

#[tokio::test]
async fn test_failed_deploy_trigger_stops_before_polling() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    server.state.lock().unwrap().deploy_status = Some(StatusCode::SERVICE_UNAVAILABLE);
    let dir = content_dir();

    let err = server
        .client()
        .deploy_with(&content.guid, dir.path(), &fast_polls(3), |_| future::ready(()), |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(matches!(err, ConnectError::Http { ref message, .. } if message == "Deployment unavailable"));
    let state = server.state.lock().unwrap();
    assert_eq!(state.uploads.len(), 1);
    assert!(state.deploys.is_empty());
    assert_eq!(state.task_polls, 0);
    drop(state);
    assert!(leftover_bundles(dir.path()).is_empty());
}

#[tokio::test]
async fn test_task_lookup_failure_mid_poll_propagates() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    {
        let mut state = server.state.lock().unwrap();
        state.task_script = vec![task(&["a"], false), task(&["a", "b"], false)];
        state.task_missing_after = Some(2);
    }
    let dir = content_dir();

    let mut lines = Vec::new();
    let err = server
        .client()
        .deploy_with(
            &content.guid,
            dir.path(),
            &fast_polls(10),
            |_| future::ready(()),
            |line| lines.push(line.to_string()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::Http { status: 404, .. }), "got {err:?}");
    assert_eq!(lines, vec!["a", "b"]);
    assert_eq!(server.state.lock().unwrap().task_polls, 3);
    assert!(leftover_bundles(dir.path()).is_empty());
}

#[tokio::test]
async fn test_zero_poll_budget_makes_no_request() {
    let server = FakeConnect::start().await;
    let content = create(&server).await;
    let dir = content_dir();
    let before = server.requests().len();

    let err = server
        .client()
        .deploy_with(&content.guid, dir.path(), &fast_polls(0), |_| future::ready(()), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::Validation(_)));
    assert_eq!(server.requests().len(), before);
    assert!(server.state.lock().unwrap().deploys.is_empty());
    assert!(leftover_bundles(dir.path()).is_empty());
}
