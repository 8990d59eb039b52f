// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands;
use cmd::common::{GlobalOptions, RelayContext};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "gunzip-relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Serve buckets from subdirectories of this directory instead of S3
    #[arg(long, global = true)]
    local_root: Option<PathBuf>,

    /// Keep relaying later records after one fails
    #[arg(long, global = true)]
    continue_on_error: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay every object named in an S3 notification
    Handle {
        /// Notification JSON file (reads stdin when omitted)
        event: Option<PathBuf>,
    },
    /// Relay one object directly
    Transfer {
        /// Bucket holding the compressed object
        #[arg(long)]
        source_bucket: String,
        /// Object key, unencoded
        #[arg(long)]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let options = GlobalOptions {
        local_root: cli.local_root,
        continue_on_error: cli.continue_on_error,
    };
    let context = RelayContext::from_env(&options)?;
    let mut stdout = std::io::stdout();

    match &cli.command {
        Commands::Handle { event } => {
            let _ = commands::handle_command(&context, event.as_deref(), &mut stdout).await?;
        }
        Commands::Transfer { source_bucket, key } => {
            let _ = commands::transfer_command(&context, source_bucket, key, &mut stdout).await?;
        }
    }
    Ok(())
}
