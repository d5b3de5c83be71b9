// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Checking a request against a caller's policy documents
//!
//! A request names a path through the scope tree, starting at the project,
//! with the resource it addresses at each level, plus the verb it wants to
//! perform at the last level.  For example, updating release "web" in
//! namespace "default" of cluster 3 in project 7 is:
//!
//! ```text
//! project=7 / cluster=3 / namespace=default / release=web   verb: update
//! ```
//!
//! Each top-level policy document is walked down this path:
//!
//! 1. The document applies starting at the path element with the document's
//!    own scope.  If the path doesn't go through that scope, the document
//!    says nothing about the request.
//! 2. At each level, a document with a non-empty resource list only matches
//!    if the path's resource at that level is in the list.
//! 3. Moving down a level, a child document for that level's scope replaces
//!    the effective verb set.  If there's no child document, every remaining
//!    level inherits the current verb set.  An empty verb set is not a
//!    request to inherit; it grants nothing.
//!
//! The request is allowed if any document grants the verb at the last level.

use crate::policy::PolicyDocument;
use crate::scope::Scope;
use crate::scope::Verb;
use berth_common::api::external::Error;
use std::fmt;
use std::str::FromStr;

/// One level of a request's scope path
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopeTarget {
    pub scope: Scope,
    pub resource: String,
}

impl ScopeTarget {
    pub fn new(scope: Scope, resource: impl Into<String>) -> ScopeTarget {
        ScopeTarget { scope, resource: resource.into() }
    }
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.scope, self.resource)
    }
}

/// A verb to be performed on the resource at the end of a scope path
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopedRequest {
    path: Vec<ScopeTarget>,
    verb: Verb,
}

impl ScopedRequest {
    /// Builds a request, checking that `path` starts at the root of the scope
    /// tree and only moves from a scope to one of its children
    pub fn new(
        path: Vec<ScopeTarget>,
        verb: Verb,
    ) -> Result<ScopedRequest, Error> {
        let Some(first) = path.first() else {
            return Err(Error::invalid_request("request scope path is empty"));
        };
        if first.scope != Scope::ROOT {
            return Err(Error::invalid_request(&format!(
                "request scope path must start at {}, not {}",
                Scope::ROOT,
                first.scope
            )));
        }
        for pair in path.windows(2) {
            if !pair[0].scope.is_parent_of(pair[1].scope) {
                return Err(Error::invalid_request(&format!(
                    "scope {} is not a child of scope {}",
                    pair[1].scope, pair[0].scope
                )));
            }
        }
        Ok(ScopedRequest { path, verb })
    }

    pub fn path(&self) -> &[ScopeTarget] {
        &self.path
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }
}

impl FromStr for ScopedRequest {
    type Err = Error;

    /// Parses `<verb> <scope>=<resource>/<scope>=<resource>/...`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, path) = s.trim().split_once(char::is_whitespace).ok_or_else(
            || Error::invalid_request("expected \"<verb> <scope path>\""),
        )?;
        let verb = Verb::from_str(verb).map_err(|_| {
            Error::invalid_request(&format!("unknown verb {:?}", verb))
        })?;
        ScopedRequest::new(parse_scope_path(path.trim())?, verb)
    }
}

/// Parses `<scope>=<resource>/<scope>=<resource>/...`
pub fn parse_scope_path(path: &str) -> Result<Vec<ScopeTarget>, Error> {
    path.split('/')
        .map(|element| {
            let (scope, resource) = element.split_once('=').ok_or_else(|| {
                Error::invalid_request(&format!(
                    "expected \"<scope>=<resource>\", found {:?}",
                    element
                ))
            })?;
            let scope = Scope::from_str(scope).map_err(|_| {
                Error::invalid_request(&format!("unknown scope {:?}", scope))
            })?;
            if resource.is_empty() {
                return Err(Error::invalid_request(&format!(
                    "missing resource for scope \"{}\"",
                    scope
                )));
            }
            Ok(ScopeTarget::new(scope, resource))
        })
        .collect()
}

/// Returns whether any of `policy` grants `request`
pub fn has_scope_access(
    policy: &[PolicyDocument],
    request: &ScopedRequest,
) -> bool {
    policy.iter().any(|document| document_grants(document, request))
}

fn document_grants(document: &PolicyDocument, request: &ScopedRequest) -> bool {
    let path = request.path();
    let Some(start) =
        path.iter().position(|target| target.scope == document.scope())
    else {
        return false;
    };

    if !document.covers_resource(&path[start].resource) {
        return false;
    }

    let mut current = document;
    for target in &path[start + 1..] {
        match current.child(target.scope) {
            Some(child) => {
                if !child.covers_resource(&target.resource) {
                    return false;
                }
                current = child;
            }
            // Nothing beneath `current` can override anything further down,
            // since children only exist along the path's own edges.
            None => break,
        }
    }

    current.verbs().contains(&request.verb())
}
