// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Policy documents
//!
//! A [`PolicyDocument`] grants a set of verbs at one [`Scope`] and may carry
//! child documents for scopes directly beneath it.  A child replaces the verb
//! set for its own subtree; a scope without a child document inherits the
//! verbs of the nearest document above it.  (See [`crate::has_scope_access`]
//! for the walk that applies these rules to a request.)
//!
//! Documents are plain values.  Nothing in this crate modifies one after it
//! has been built or deserialized.

use crate::scope::Scope;
use crate::scope::VerbSet;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Authorization rule for one scope and, recursively, the scopes beneath it
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PolicyDocument {
    scope: Scope,
    verbs: VerbSet,
    /// If non-empty, the document only applies to requests naming one of
    /// these resources at `scope`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    resources: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<Scope, PolicyDocument>,
}

impl PolicyDocument {
    pub fn new(scope: Scope, verbs: VerbSet) -> PolicyDocument {
        PolicyDocument {
            scope,
            verbs,
            resources: BTreeSet::new(),
            children: BTreeMap::new(),
        }
    }

    /// Adds `child` as the override for its scope, replacing any previous
    /// override for that scope
    pub fn with_child(mut self, child: PolicyDocument) -> PolicyDocument {
        self.children.insert(child.scope, child);
        self
    }

    /// Restricts this document to the named resources
    pub fn with_resources<I, S>(mut self, resources: I) -> PolicyDocument
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn verbs(&self) -> &VerbSet {
        &self.verbs
    }

    pub fn resources(&self) -> &BTreeSet<String> {
        &self.resources
    }

    pub fn children(&self) -> &BTreeMap<Scope, PolicyDocument> {
        &self.children
    }

    /// Returns the override for `scope`, if this document has one
    pub fn child(&self, scope: Scope) -> Option<&PolicyDocument> {
        self.children.get(&scope)
    }

    /// Returns whether this document covers `resource` at its own scope
    pub fn covers_resource(&self, resource: &str) -> bool {
        self.resources.is_empty() || self.resources.contains(resource)
    }

    /// Checks that this document only uses edges that exist in the scope
    /// tree
    ///
    /// Documents built with [`PolicyDocument::with_child()`] can still be
    /// invalid (e.g., a `namespace` child directly under `project`), and
    /// deserialized documents can additionally disagree between a child's map
    /// key and its own `scope`.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        for (key, child) in &self.children {
            if *key != child.scope {
                return Err(PolicyValidationError::ChildKeyMismatch {
                    key: *key,
                    child: child.scope,
                });
            }
            if !self.scope.is_parent_of(child.scope) {
                return Err(PolicyValidationError::NotAChild {
                    parent: self.scope,
                    child: child.scope,
                });
            }
            child.validate()?;
        }
        Ok(())
    }
}

/// Validates every document in a list
pub fn validate_documents(
    documents: &[PolicyDocument],
) -> Result<(), PolicyValidationError> {
    documents.iter().try_for_each(PolicyDocument::validate)
}

/// Describes how a policy document disagrees with the scope tree
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PolicyValidationError {
    #[error("child keyed by scope {key:?} has scope {child:?}")]
    ChildKeyMismatch { key: Scope, child: Scope },
    #[error("scope {child:?} is not a child of scope {parent:?}")]
    NotAChild { parent: Scope, child: Scope },
}

/// A named, identifiable list of policy documents
///
/// This is either one of the canned policies (see [`crate::CannedPolicy`]) or
/// a custom policy that a project created.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApiPolicy {
    pub uid: String,
    pub name: String,
    pub policy: Vec<PolicyDocument>,
}
