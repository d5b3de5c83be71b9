// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data structures and related facilities for representing resources in the
//! external API
//!
//! The contents here are all HTTP-agnostic.

mod error;
pub use error::*;

use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FormatResult;

/// Identifies a type of API resource
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub enum ResourceType {
    ProjectRole,
    Policy,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter) -> FormatResult {
        write!(
            f,
            "{}",
            match self {
                ResourceType::ProjectRole => "project role",
                ResourceType::Policy => "policy",
            }
        )
    }
}

/// Result of a create operation for the specified type
pub type CreateResult<T> = Result<T, Error>;
/// Result of a lookup operation for the specified type
pub type LookupResult<T> = Result<T, Error>;
