//! Deployment module

pub mod fsm;
pub mod poller;
pub mod workflow;

pub use fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
pub use poller::{poll_task, OutputTracker, PollOptions};
pub use workflow::{deploy_directory, DeployOptions, Deployment};
