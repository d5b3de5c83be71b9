// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Executable program to resolve and check project authorization policies

use anyhow::Context;
use berth_authz_cli::run_command;
use berth_authz_cli::Command;
use berth_authz_cli::Config;
use berth_common::cmd::fatal;
use berth_common::cmd::CmdError;
use camino::Utf8PathBuf;
use clap::Parser;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[clap(
    name = "policy-check",
    about = "Resolve a caller's policy documents and check requests"
)]
struct Args {
    #[clap(name = "CONFIG_FILE_PATH", action)]
    config_file_path: Utf8PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    if let Err(cmd_error) = do_run().await {
        fatal(cmd_error);
    }
}

async fn do_run() -> Result<(), CmdError> {
    let args = Args::parse();

    let config = Config::from_file(&args.config_file_path)
        .map_err(|e| CmdError::Usage(e.to_string()))?;
    let store = config
        .seed_store()
        .map_err(|e| CmdError::Usage(e.to_string()))?;
    let log = config
        .log
        .to_logger("policy-check")
        .context("failed to initialize logger")
        .map_err(CmdError::Failure)?;

    let output = run_command(&log, Arc::new(store), &args.command)
        .await
        .map_err(CmdError::Failure)?;
    println!("{}", output);
    Ok(())
}
