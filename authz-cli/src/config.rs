// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces for parsing configuration files for `policy-check`

use berth_authz::memory::InMemoryStore;
use berth_authz::PolicyDocument;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use dropshot::ConfigLogging;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration for `policy-check`
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Config {
    /// Logging configuration.
    pub log: ConfigLogging,
    /// Project role assignments to seed the store with.
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
    /// Custom policies to seed the store with.
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoleConfig {
    pub project_id: u64,
    pub user_id: u64,
    pub kind: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PolicyConfig {
    pub project_id: u64,
    pub uid: String,
    pub name: String,
    pub created_by_user_id: u64,
    /// JSON-encoded list of policy documents, as stored
    pub documents: String,
}

impl Config {
    /// Load a `Config` from the given TOML file
    pub fn from_file(path: &Utf8Path) -> Result<Config, LoadError> {
        let file_contents = std::fs::read_to_string(path)
            .map_err(|err| LoadError::Io { path: path.into(), err })?;
        let config_parsed: Config = toml::from_str(&file_contents)
            .map_err(|err| LoadError::Parse { path: path.into(), err })?;
        Ok(config_parsed)
    }

    /// Builds a store holding the roles and policies in this config
    ///
    /// Policies go through the same checks as any other custom policy
    /// creation, so a config can't smuggle in a reserved UID.
    pub fn seed_store(&self) -> Result<InMemoryStore, LoadError> {
        let store = InMemoryStore::new();
        for role in &self.roles {
            store.set_project_role(role.project_id, role.user_id, &role.kind);
        }
        for policy in &self.policies {
            let documents: Vec<PolicyDocument> =
                serde_json::from_str(&policy.documents).map_err(|err| {
                    LoadError::PolicyParse { uid: policy.uid.clone(), err }
                })?;
            store
                .create_policy(
                    policy.project_id,
                    &policy.uid,
                    &policy.name,
                    policy.created_by_user_id,
                    &documents,
                )
                .map_err(|err| LoadError::Policy {
                    uid: policy.uid.clone(),
                    err,
                })?;
        }
        Ok(store)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading \"{path}\": {err}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing \"{path}\": {err}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
    #[error("error parsing documents of policy {uid:?}: {err}")]
    PolicyParse {
        uid: String,
        #[source]
        err: serde_json::Error,
    },
    #[error("error creating policy {uid:?}: {err}")]
    Policy {
        uid: String,
        #[source]
        err: berth_common::api::external::Error,
    },
}
