//! instllr entry point
//!
//! Parses the command line, runs the selected command and turns any failure into a single
//! `error: ...` line on stderr with exit status 1.
//!
//! - `install` - Install or upgrade a service from a GitHub release
//! - `uninstall` - Stop and unregister a service

use anyhow::Result;
use clap::Parser;
use instllr::cli;
use instllr::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
