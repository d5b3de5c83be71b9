// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project roles
//!
//! Role assignments belong to the project membership subsystem.  This crate
//! only reads them: a user has at most one role in a project, and the role's
//! kind selects one of the canned policies.

use serde::Deserialize;
use serde::Serialize;
use std::borrow::Cow;

/// The kinds of project role that carry a canned policy
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::EnumIter)]
pub enum RoleKind {
    Admin,
    Developer,
    Viewer,
}

impl RoleKind {
    pub fn to_database_string(&self) -> Cow<'static, str> {
        match self {
            RoleKind::Admin => "admin",
            RoleKind::Developer => "developer",
            RoleKind::Viewer => "viewer",
        }
        .into()
    }

    // WARNING: if you're considering changing this (including removing
    // variants), be sure you've considered how rows written previous to your
    // change will be handled.
    pub fn from_database_string(
        s: &str,
    ) -> Result<RoleKind, UnsupportedRoleKind> {
        match s {
            "admin" => Ok(RoleKind::Admin),
            "developer" => Ok(RoleKind::Developer),
            "viewer" => Ok(RoleKind::Viewer),
            _ => Err(UnsupportedRoleKind(s.to_string())),
        }
    }
}

/// A stored role kind that this version does not know how to authorize
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{0} role not supported")]
pub struct UnsupportedRoleKind(pub String);

/// A user's role in a project, as stored
///
/// `kind` is kept as the stored string.  It's only interpreted when a policy
/// is loaded, so that an unknown kind denies access rather than failing to
/// load the row at all.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProjectRole {
    pub project_id: u64,
    pub user_id: u64,
    pub kind: String,
}

impl ProjectRole {
    pub fn new(project_id: u64, user_id: u64, kind: RoleKind) -> ProjectRole {
        ProjectRole {
            project_id,
            user_id,
            kind: kind.to_database_string().into_owned(),
        }
    }
}
