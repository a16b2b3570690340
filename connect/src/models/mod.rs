//! Domain models

pub mod content;
pub mod task;
pub mod user;

pub use content::{Content, ContentFilter, ContentUpdate, ContentUrls, NewContent};
pub use task::DeploymentTask;
pub use user::User;
