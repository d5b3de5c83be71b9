// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Project authorization
//!
//! ## Basics
//!
//! Every request made against a project is an attempt by some *caller* to
//! perform a *verb* on a resource that lives at some *scope*.
//!
//! - **caller** is either a user acting in a project (through their web
//!   session or the CLI) or an API token that was issued for a project.
//! - **scope** is a node in a fixed tree rooted at the project: clusters,
//!   namespaces inside clusters, releases inside namespaces, registries,
//!   infrastructure, project settings, and so on.  See [`Scope`].
//! - **verb** is one of `read`, `list`, `create`, `update`, `delete`.
//!
//! What a caller may do is described by a list of [`PolicyDocument`]s.  A
//! document grants verbs at one scope and can override that grant for the
//! scopes beneath it.  Scopes without an override inherit.
//!
//! ## Where documents come from
//!
//! Users get one of three *canned* policies, depending on their role in the
//! project:
//!
//! - "admin": everything
//! - "developer": everything, except that project settings are read-only
//! - "viewer": read-only, and project settings are not visible at all
//!
//! API tokens name a policy by UID.  That's either one of the canned policy
//! UIDs above or the UID of a *custom* policy that was created in the token's
//! project.
//!
//! [`RepoPolicyDocumentLoader`] does this resolution, using a [`RoleStore`]
//! to find the user's role and a [`PolicyStore`] to find custom policies.
//!
//! ## Checking a request
//!
//! [`has_scope_access`] walks a request's scope path through a caller's
//! documents and decides whether the verb is granted.  Its module
//! documentation describes the rules in detail.
//!
//! ## Example
//!
//! User 42 is a developer in project 7:
//!
//! ```text
//! [
//!   {
//!     scope: project,
//!     verbs: [read, list, create, update, delete],
//!     children: {
//!       settings: { scope: settings, verbs: [read, list] }
//!     }
//!   }
//! ]
//! ```
//!
//! They can deploy a release in any cluster, read the project's settings, and
//! not change them.

mod access;
pub use access::has_scope_access;
pub use access::parse_scope_path;
pub use access::ScopeTarget;
pub use access::ScopedRequest;

mod catalog;
pub use catalog::is_reserved_uid;
pub use catalog::CannedPolicy;
pub use catalog::ADMIN_POLICY;
pub use catalog::DEVELOPER_POLICY;
pub use catalog::VIEWER_POLICY;

mod loader;
pub use loader::resolve_policy_by_uid;
pub use loader::ApiToken;
pub use loader::PolicyDocumentLoader;
pub use loader::PolicyLoaderOpts;
pub use loader::RepoPolicyDocumentLoader;

pub mod memory;

mod policy;
pub use policy::validate_documents;
pub use policy::ApiPolicy;
pub use policy::PolicyDocument;
pub use policy::PolicyValidationError;

mod role;
pub use role::ProjectRole;
pub use role::RoleKind;
pub use role::UnsupportedRoleKind;

mod scope;
pub use scope::read_verb_group;
pub use scope::read_write_verb_group;
pub use scope::Scope;
pub use scope::Verb;
pub use scope::VerbSet;

mod storage;
pub use storage::PolicyConversionError;
pub use storage::PolicyStore;
pub use storage::RoleStore;
pub use storage::StoredPolicy;
