//! connectapi - Entry Point
//!
//! Command-line front end for the Connect publishing API.

use std::process::ExitCode;

use clap::Parser;
use connectapi::cli::{finish, run, Cli};
use connectapi::logs::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A local .env may provide CONNECT_SERVER and CONNECT_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_options()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    finish(run(cli).await, &mut std::io::stderr())
}
