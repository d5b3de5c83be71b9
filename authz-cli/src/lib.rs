// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Library interface to `policy-check`
//!
//! `policy-check` resolves a caller's policy documents the same way the API
//! server does, against roles and custom policies taken from a config file,
//! and optionally checks one request against them.

mod config;
pub use config::Config;
pub use config::LoadError;
pub use config::PolicyConfig;
pub use config::RoleConfig;

use anyhow::Context;
use berth_authz::has_scope_access;
use berth_authz::memory::InMemoryStore;
use berth_authz::parse_scope_path;
use berth_authz::ApiToken;
use berth_authz::PolicyDocumentLoader;
use berth_authz::PolicyLoaderOpts;
use berth_authz::RepoPolicyDocumentLoader;
use berth_authz::ScopedRequest;
use berth_authz::Verb;
use slog::info;
use slog::Logger;
use std::sync::Arc;

/// Identifies the caller, either as a user in a project or as an API token
#[derive(Clone, Debug, clap::Args)]
pub struct CallerArgs {
    /// project the user is acting in
    #[clap(long, requires = "user_id", conflicts_with = "policy_uid")]
    pub project_id: Option<u64>,

    /// user acting in the project
    #[clap(long, requires = "project_id")]
    pub user_id: Option<u64>,

    /// project the API token was issued for
    #[clap(long, requires = "policy_uid")]
    pub token_project: Option<u64>,

    /// policy UID carried by the API token
    #[clap(long, requires = "token_project")]
    pub policy_uid: Option<String>,
}

impl CallerArgs {
    pub fn loader_opts(&self) -> PolicyLoaderOpts {
        match (&self.policy_uid, self.token_project) {
            (Some(policy_uid), Some(project_id)) => {
                PolicyLoaderOpts::for_token(ApiToken {
                    name: String::from("policy-check"),
                    project_id,
                    policy_uid: policy_uid.clone(),
                })
            }
            // Anything incomplete goes to the loader as-is so that it's
            // rejected the same way the server would reject it.
            _ => PolicyLoaderOpts::for_user(
                self.project_id.unwrap_or(0),
                self.user_id.unwrap_or(0),
            ),
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Print the policy documents that apply to a caller
    Load {
        #[clap(flatten)]
        caller: CallerArgs,
    },
    /// Check whether a caller may perform a verb on a resource
    Check {
        #[clap(flatten)]
        caller: CallerArgs,

        /// verb to check (read, list, create, update, delete)
        #[clap(long)]
        verb: Verb,

        /// scope path to the resource, e.g. "project=7/cluster=3"
        #[clap(long)]
        path: String,
    },
}

/// Runs `command` against the roles and policies in `store`, returning what
/// should be printed
///
/// `store` is normally the result of [`Config::seed_store()`].
pub async fn run_command(
    log: &Logger,
    store: Arc<InMemoryStore>,
    command: &Command,
) -> Result<String, anyhow::Error> {
    let loader = RepoPolicyDocumentLoader::new(log, store.clone(), store);

    match command {
        Command::Load { caller } => {
            let documents = loader
                .load_policy_documents(&caller.loader_opts())
                .await
                .context("loading policy documents")?;
            serde_json::to_string_pretty(&documents)
                .context("serializing policy documents")
        }
        Command::Check { caller, verb, path } => {
            let request = ScopedRequest::new(parse_scope_path(path)?, *verb)?;
            let documents = loader
                .load_policy_documents(&caller.loader_opts())
                .await
                .context("loading policy documents")?;
            let allowed = has_scope_access(&documents, &request);
            info!(log, "checked request";
                "verb" => %verb,
                "path" => path,
                "allowed" => allowed,
            );
            Ok(String::from(if allowed { "allowed" } else { "denied" }))
        }
    }
}
