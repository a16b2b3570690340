//! connectapi
//!
//! Typed client for the Connect publishing API: users, content CRUD and the
//! bundle upload/deploy workflow.
//!
//! ```no_run
//! use connectapi::{ConnectClient, NewContent};
//!
//! # async fn example() -> Result<(), connectapi::ConnectError> {
//! let client = ConnectClient::from_env()?;
//! let content = client.create_content(&NewContent::new("Quarterly report")).await?;
//! let fetched = client.get_content(&content.guid).await?;
//! assert_eq!(fetched.title.as_deref(), Some("Quarterly report"));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod bundle;
pub mod cli;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod settings;
pub mod utils;

pub use api::ConnectClient;
pub use bundle::{Bundle, BundleOptions};
pub use deploy::{DeployOptions, Deployment, DeploymentState, PollOptions};
pub use errors::ConnectError;
pub use models::{Content, ContentFilter, ContentUpdate, ContentUrls, DeploymentTask, NewContent, User};
pub use settings::{Settings, SettingsInput};
