// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory implementation of the role and policy stores
//!
//! Used by the test suites and by `policy-check`, which seeds it from its
//! config file.

use crate::catalog::is_reserved_uid;
use crate::policy::validate_documents;
use crate::policy::PolicyDocument;
use crate::role::ProjectRole;
use crate::storage::PolicyStore;
use crate::storage::RoleStore;
use crate::storage::StoredPolicy;
use berth_common::api::external::CreateResult;
use berth_common::api::external::Error;
use berth_common::api::external::LookupResult;
use berth_common::api::external::LookupType;
use berth_common::api::external::ResourceType;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    /// keyed by (project_id, user_id)
    roles: BTreeMap<(u64, u64), ProjectRole>,
    /// keyed by (project_id, uid)
    policies: BTreeMap<(u64, String), StoredPolicy>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    policy_reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Sets the role of `user_id` in `project_id`, replacing any previous role
    ///
    /// `kind` is stored as given, the same way the membership subsystem would
    /// store it.
    pub fn set_project_role(&self, project_id: u64, user_id: u64, kind: &str) {
        let role = ProjectRole { project_id, user_id, kind: kind.to_string() };
        self.inner.lock().unwrap().roles.insert((project_id, user_id), role);
    }

    pub fn remove_project_role(&self, project_id: u64, user_id: u64) {
        self.inner.lock().unwrap().roles.remove(&(project_id, user_id));
    }

    /// Creates a custom policy in `project_id`
    ///
    /// Fails if `uid` is reserved for a canned policy, if `documents` don't
    /// fit the scope tree, or if the project already has a policy `uid`.
    pub fn create_policy(
        &self,
        project_id: u64,
        uid: &str,
        name: &str,
        created_by_user_id: u64,
        documents: &[PolicyDocument],
    ) -> CreateResult<StoredPolicy> {
        if is_reserved_uid(uid) {
            return Err(Error::invalid_request(&format!(
                "policy uid {:?} is reserved",
                uid
            )));
        }
        validate_documents(documents).map_err(|e| {
            Error::invalid_request(&format!("invalid policy document: {}", e))
        })?;

        let stored = StoredPolicy::new(
            project_id,
            uid,
            name,
            created_by_user_id,
            documents,
        )?;
        let mut inner = self.inner.lock().unwrap();
        let key = (project_id, uid.to_string());
        if inner.policies.contains_key(&key) {
            return Err(Error::ObjectAlreadyExists {
                type_name: ResourceType::Policy,
                object_name: uid.to_string(),
            });
        }
        inner.policies.insert(key, stored.clone());
        Ok(stored)
    }

    /// Stores `stored` as-is, replacing any policy with the same key
    ///
    /// Nothing is checked.  This is how tests produce rows that were
    /// corrupted or written by some other version.
    pub fn insert_raw_policy(&self, stored: StoredPolicy) {
        let key = (stored.project_id, stored.uid.clone());
        self.inner.lock().unwrap().policies.insert(key, stored);
    }

    /// Returns how many times [`PolicyStore::read_policy()`] was called
    pub fn policy_reads(&self) -> usize {
        self.policy_reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RoleStore for InMemoryStore {
    async fn read_project_role(
        &self,
        project_id: u64,
        user_id: u64,
    ) -> LookupResult<ProjectRole> {
        self.inner
            .lock()
            .unwrap()
            .roles
            .get(&(project_id, user_id))
            .cloned()
            .ok_or_else(|| {
                LookupType::ByCompositeId(format!(
                    "project_id = {}, user_id = {}",
                    project_id, user_id
                ))
                .into_not_found(ResourceType::ProjectRole)
            })
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryStore {
    async fn read_policy(
        &self,
        project_id: u64,
        uid: &str,
    ) -> LookupResult<StoredPolicy> {
        self.policy_reads.fetch_add(1, Ordering::SeqCst);
        self.inner
            .lock()
            .unwrap()
            .policies
            .get(&(project_id, uid.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found_by_name(ResourceType::Policy, uid))
    }
}
