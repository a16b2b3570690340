//! Command-line interface

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::api::ConnectClient;
use crate::bundle::BundleOptions;
use crate::deploy::{DeployOptions, DeploymentState, PollOptions};
use crate::logs::{LogLevel, LogOptions};
use crate::models::content::{Content, ContentFilter, ContentUpdate, NewContent};
use crate::settings::{Settings, SettingsInput};
use crate::utils::version_info;

#[derive(Parser, Debug)]
#[command(
    name = "connectapi",
    version,
    about = "Manage and deploy content on a Connect server"
)]
pub struct Cli {
    /// Server URL (defaults to $CONNECT_SERVER)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// API key (defaults to $CONNECT_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API endpoint override (defaults to $API_ENDPOINT, else {server}/__api__/v1)
    #[arg(long, global = true)]
    pub api_endpoint: Option<String>,

    /// Timeout in seconds for ordinary API requests
    #[arg(long, global = true, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Timeout in seconds for bundle uploads
    #[arg(long, global = true, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    pub upload_timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write logs to this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the user owning the API key
    Whoami,

    /// List content
    List {
        /// Only content owned by the current user
        #[arg(long, conflicts_with = "owner")]
        mine: bool,

        /// Only content owned by this user guid
        #[arg(long)]
        owner: Option<String>,

        /// Only content with this name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show one content item
    Get { guid: String },

    /// Create a content item
    Create {
        #[arg(long)]
        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Update the editable fields of a content item
    Update {
        guid: String,

        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete one content item, or all of your content when no guid is given
    Delete {
        guid: Option<String>,

        /// Do not ask for confirmation
        #[arg(long)]
        force: bool,
    },

    /// Bundle a directory, deploy it to a content item and wait for the result
    Deploy {
        guid: String,

        /// Directory containing manifest.json
        dir: PathBuf,

        /// Source file extension to include (repeatable)
        #[arg(long = "ext", default_values_t = vec!["R".to_string()])]
        extensions: Vec<String>,

        /// Seconds between task status checks
        #[arg(long, default_value_t = 1)]
        poll_interval_secs: u64,

        /// Give up after this many task status checks
        #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
        max_polls: u32,

        /// Keep the generated bundle archive
        #[arg(long)]
        keep_bundle: bool,
    },

    /// Show version and build information
    Version,
}

/// Optional editable fields shared by `create` and `update`
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// all, logged_in or acl
    #[arg(long)]
    pub access_type: Option<String>,
    #[arg(long)]
    pub connection_timeout: Option<i32>,
    #[arg(long)]
    pub read_timeout: Option<i32>,
    #[arg(long)]
    pub init_timeout: Option<i32>,
    #[arg(long)]
    pub idle_timeout: Option<i32>,
    #[arg(long)]
    pub max_processes: Option<i32>,
    #[arg(long)]
    pub min_processes: Option<i32>,
    #[arg(long)]
    pub max_conns_per_process: Option<i32>,
    #[arg(long)]
    pub load_factor: Option<f64>,
    #[arg(long)]
    pub run_as: Option<String>,
    #[arg(long)]
    pub run_as_current_user: Option<bool>,
}

impl FieldArgs {
    /// Partial update with the given title and these fields
    pub fn to_update(&self, title: Option<String>) -> ContentUpdate {
        ContentUpdate {
            name: self.name.clone(),
            title,
            description: self.description.clone(),
            access_type: self.access_type.clone(),
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
            init_timeout: self.init_timeout,
            idle_timeout: self.idle_timeout,
            max_processes: self.max_processes,
            min_processes: self.min_processes,
            max_conns_per_process: self.max_conns_per_process,
            load_factor: self.load_factor,
            run_as: self.run_as.clone(),
            run_as_current_user: self.run_as_current_user,
        }
    }

    /// Creation payload with the given title and these fields
    pub fn to_new_content(&self, title: String) -> NewContent {
        let mut content = NewContent::new(title);
        content.name = self.name.clone();
        content.description = self.description.clone();
        if let Some(access_type) = &self.access_type {
            content.access_type = Some(access_type.clone());
        }
        content.connection_timeout = self.connection_timeout;
        content.read_timeout = self.read_timeout;
        content.init_timeout = self.init_timeout;
        content.idle_timeout = self.idle_timeout;
        content.max_processes = self.max_processes;
        content.min_processes = self.min_processes;
        content.max_conns_per_process = self.max_conns_per_process;
        content.load_factor = self.load_factor;
        content.run_as = self.run_as.clone();
        content.run_as_current_user = self.run_as_current_user.unwrap_or(false);
        content
    }
}

impl Cli {
    pub fn settings_input(&self) -> SettingsInput {
        SettingsInput {
            server: self.server.clone(),
            api_key: self.api_key.clone(),
            api_endpoint: self.api_endpoint.clone(),
        }
    }

    /// Apply the timeout flags to resolved settings
    pub fn apply_timeouts(&self, mut settings: Settings) -> Settings {
        settings.request_timeout = Duration::from_secs(self.timeout_secs);
        settings.upload_timeout = Duration::from_secs(self.upload_timeout_secs);
        settings
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level,
            log_dir: self.log_dir.clone(),
            json_format: self.log_json,
        }
    }
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Commands::Version) {
        return print_json(&version_info());
    }

    let settings = Settings::resolve(cli.settings_input()).context("failed to configure client")?;
    let settings = cli.apply_timeouts(settings);
    info!("Using API endpoint {}", settings.api_endpoint());
    let client = ConnectClient::new(settings)?;

    match cli.command {
        Commands::Whoami => print_json(&client.current_user().await?),

        Commands::List { mine, owner, name } => {
            let owner_guid = if mine {
                Some(client.current_user().await?.guid)
            } else {
                owner
            };
            let filter = ContentFilter { owner_guid, name };
            print_json(&client.list_content(&filter).await?)
        }

        Commands::Get { guid } => print_json(&client.get_content(&guid).await?),

        Commands::Create { title, fields } => {
            let created = client.create_content(&fields.to_new_content(title)).await?;
            print_json(&created)
        }

        Commands::Update {
            guid,
            title,
            fields,
        } => {
            let update = fields.to_update(title);
            let updated = client
                .update_content(&guid, &update)
                .await
                .with_context(|| format!("failed to update {}", guid))?;
            print_json(&updated)
        }

        Commands::Delete { guid, force } => {
            let targets = match guid {
                Some(guid) => vec![client.get_content(&guid).await?],
                None => client.my_content().await?,
            };
            let deleted = delete_with_confirmation(&client, targets, force, prompt_delete).await?;
            println!("Deleted {} content item(s)", deleted.len());
            Ok(())
        }

        Commands::Deploy {
            guid,
            dir,
            extensions,
            poll_interval_secs,
            max_polls,
            keep_bundle,
        } => {
            let options = DeployOptions {
                bundle: BundleOptions {
                    source_extensions: extensions,
                },
                poll: PollOptions {
                    interval: Duration::from_secs(poll_interval_secs),
                    max_polls,
                },
                keep_bundle,
            };

            let deployment = client
                .deploy(&guid, &dir, &options, |line| println!("{}", line.dimmed()))
                .await
                .with_context(|| format!("failed to deploy {} to {}", dir.display(), guid))?;

            if let Some(path) = &deployment.bundle_path {
                println!("Bundle kept at {}", path.display());
            }

            match deployment.state {
                DeploymentState::Finished => {
                    println!("{} {}", "Deployed".green().bold(), deployment.urls.content_url);
                    println!("Dashboard: {}", deployment.urls.dashboard_url);
                    Ok(())
                }
                _ => Err(anyhow!(
                    "deployment task {} failed: {}",
                    deployment.task.task_id,
                    deployment.task.error.unwrap_or_default()
                )),
            }
        }

        Commands::Version => print_json(&version_info()),
    }
}

/// Report the outcome of [`run`] once on `err_out` and pick the exit code
pub fn finish<W: Write>(result: Result<()>, err_out: &mut W) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(err_out, "Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Delete `targets`, asking `confirm` for each one unless `force` is set
///
/// Returns the guids that were deleted. Stops at the first failed request.
pub async fn delete_with_confirmation<C>(
    client: &ConnectClient,
    targets: Vec<Content>,
    force: bool,
    mut confirm: C,
) -> Result<Vec<String>>
where
    C: FnMut(&Content) -> Result<bool>,
{
    let mut deleted = Vec::new();
    for content in targets {
        if !force && !confirm(&content)? {
            info!("Skipping {}", content.guid);
            continue;
        }
        client.delete_content(&content.guid).await?;
        deleted.push(content.guid);
    }
    Ok(deleted)
}

fn prompt_delete(content: &Content) -> Result<bool> {
    let label = content
        .title
        .as_deref()
        .or(content.name.as_deref())
        .unwrap_or("untitled");
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("Delete '{}' ({})?", label, content.guid))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
