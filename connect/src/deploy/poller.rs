//! Task polling with incremental log output

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::ConnectError;
use crate::http::client::HttpClient;
use crate::models::task::DeploymentTask;

/// Poller options
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between two task fetches
    pub interval: Duration,

    /// Maximum number of task fetches before giving up
    pub max_polls: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: 600,
        }
    }
}

impl PollOptions {
    /// Reject a budget that could never observe the task
    pub fn validate(&self) -> Result<(), ConnectError> {
        if self.max_polls == 0 {
            return Err(ConnectError::Validation(
                "max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tracks which part of a cumulative log has already been surfaced
#[derive(Debug, Default)]
pub struct OutputTracker {
    seen: usize,
    last: Vec<String>,
}

impl OutputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines surfaced so far
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Record a new cumulative log and return the lines not seen before
    ///
    /// A log identical to the previous one yields nothing. A log shorter
    /// than what was already seen yields nothing and becomes the new baseline.
    pub fn advance<'a>(&mut self, output: &'a [String]) -> &'a [String] {
        if output == self.last.as_slice() {
            return &[];
        }

        let new = output.get(self.seen..).unwrap_or(&[]);
        self.seen = output.len();
        self.last = output.to_vec();
        new
    }
}

/// Poll a task until it finishes or the poll budget runs out
///
/// New log lines are logged and handed to `on_output` in order, each exactly
/// once. `sleep_fn` is awaited between fetches.
pub async fn poll_task<S, F, O>(
    http: &HttpClient,
    task_id: &str,
    options: &PollOptions,
    sleep_fn: S,
    mut on_output: O,
) -> Result<DeploymentTask, ConnectError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
    O: FnMut(&str),
{
    options.validate()?;
    let mut tracker = OutputTracker::new();

    for poll in 1..=options.max_polls {
        if poll > 1 {
            sleep_fn(options.interval).await;
        }

        let task = DeploymentTask::from_response(task_id, http.get_task(task_id).await?);
        for line in tracker.advance(&task.output) {
            info!(task_id, "{}", line);
            on_output(line.as_str());
        }

        if task.finished {
            info!("Task {} finished after {} polls (code {})", task_id, poll, task.code);
            return Ok(task);
        }

        debug!("Task {} still running (poll {}/{})", task_id, poll, options.max_polls);
    }

    Err(ConnectError::DeployTimeout {
        task_id: task_id.to_string(),
        polls: options.max_polls,
    })
}
