// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in ("canned") policies
//!
//! These are used for callers whose access comes from their project role, and
//! for API tokens that reference one of the reserved policy UIDs.  They are
//! built once, on first use, and never change afterwards.

use crate::policy::ApiPolicy;
use crate::policy::PolicyDocument;
use crate::scope::read_verb_group;
use crate::scope::read_write_verb_group;
use crate::scope::Scope;
use crate::scope::VerbSet;
use once_cell::sync::Lazy;
use strum::EnumIter;

/// Full access to everything in the project.
pub static ADMIN_POLICY: Lazy<Vec<PolicyDocument>> = Lazy::new(|| {
    vec![PolicyDocument::new(Scope::Project, read_write_verb_group())]
});

/// Full access to everything in the project except settings, which are
/// read-only.
pub static DEVELOPER_POLICY: Lazy<Vec<PolicyDocument>> = Lazy::new(|| {
    vec![PolicyDocument::new(Scope::Project, read_write_verb_group())
        .with_child(PolicyDocument::new(Scope::Settings, read_verb_group()))]
});

/// Read access to everything in the project except settings, which are not
/// visible at all.
pub static VIEWER_POLICY: Lazy<Vec<PolicyDocument>> = Lazy::new(|| {
    vec![PolicyDocument::new(Scope::Project, read_verb_group())
        .with_child(PolicyDocument::new(Scope::Settings, VerbSet::new()))]
});

/// Identifies one of the canned policies
#[derive(Clone, Copy, Debug, EnumIter, Eq, PartialEq)]
pub enum CannedPolicy {
    Admin,
    Developer,
    Viewer,
}

impl CannedPolicy {
    /// Returns the canned policy reserved under `uid`, if any
    ///
    /// Custom policies may never be created with one of these UIDs.
    pub fn from_uid(uid: &str) -> Option<CannedPolicy> {
        match uid {
            "admin" => Some(CannedPolicy::Admin),
            "developer" => Some(CannedPolicy::Developer),
            "viewer" => Some(CannedPolicy::Viewer),
            _ => None,
        }
    }

    /// The reserved UID of this policy, which is also its name
    pub fn uid(&self) -> &'static str {
        match self {
            CannedPolicy::Admin => "admin",
            CannedPolicy::Developer => "developer",
            CannedPolicy::Viewer => "viewer",
        }
    }

    pub fn documents(&self) -> &'static [PolicyDocument] {
        match self {
            CannedPolicy::Admin => &ADMIN_POLICY,
            CannedPolicy::Developer => &DEVELOPER_POLICY,
            CannedPolicy::Viewer => &VIEWER_POLICY,
        }
    }

    pub fn api_policy(&self) -> ApiPolicy {
        ApiPolicy {
            uid: self.uid().to_string(),
            name: self.uid().to_string(),
            policy: self.documents().to_vec(),
        }
    }
}

/// Returns whether `uid` is reserved for a canned policy
pub fn is_reserved_uid(uid: &str) -> bool {
    CannedPolicy::from_uid(uid).is_some()
}
