// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission scopes and verbs
//!
//! Every API resource lives at some [`Scope`].  Scopes form a fixed tree
//! rooted at [`Scope::Project`]:
//!
//! ```text
//! project
//! ├── cluster
//! │   └── namespace
//! │       └── release
//! ├── registry
//! ├── helm_repo
//! ├── git_installation
//! ├── infra
//! │   └── operation
//! ├── datastore
//! └── settings
//! ```
//!
//! The shape of the tree is part of the system, not of any policy.  Policy
//! documents can only attach rules to the scopes that exist here, and only
//! along the edges shown.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// A node in the permission scope tree
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    Project,
    Cluster,
    Namespace,
    Release,
    Registry,
    HelmRepo,
    GitInstallation,
    Infra,
    Operation,
    Datastore,
    Settings,
}

impl Scope {
    /// The root of the scope tree
    pub const ROOT: Scope = Scope::Project;

    /// Returns the parent of this scope, or `None` for the root
    pub fn parent(&self) -> Option<Scope> {
        match self {
            Scope::Project => None,
            Scope::Cluster
            | Scope::Registry
            | Scope::HelmRepo
            | Scope::GitInstallation
            | Scope::Infra
            | Scope::Datastore
            | Scope::Settings => Some(Scope::Project),
            Scope::Namespace => Some(Scope::Cluster),
            Scope::Release => Some(Scope::Namespace),
            Scope::Operation => Some(Scope::Infra),
        }
    }

    /// Returns the scopes whose parent is this scope
    pub fn children(&self) -> impl Iterator<Item = Scope> + '_ {
        Scope::iter().filter(move |s| s.parent() == Some(*self))
    }

    /// Returns whether `child` is directly beneath this scope in the tree
    pub fn is_parent_of(&self, child: Scope) -> bool {
        child.parent() == Some(*self)
    }
}

/// An atomic action that a policy can grant
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Verb {
    Read,
    List,
    Create,
    Update,
    Delete,
}

/// A set of verbs granted at one scope
pub type VerbSet = BTreeSet<Verb>;

/// Verbs that observe but never change state
pub fn read_verb_group() -> VerbSet {
    [Verb::Read, Verb::List].into_iter().collect()
}

/// Every verb
pub fn read_write_verb_group() -> VerbSet {
    [Verb::Read, Verb::List, Verb::Create, Verb::Update, Verb::Delete]
        .into_iter()
        .collect()
}
