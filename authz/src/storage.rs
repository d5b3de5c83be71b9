// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces to the storage that authorization depends on

use crate::policy::validate_documents;
use crate::policy::ApiPolicy;
use crate::policy::PolicyDocument;
use crate::policy::PolicyValidationError;
use crate::role::ProjectRole;
use berth_common::api::external::Error;
use berth_common::api::external::LookupResult;
use serde::Deserialize;
use serde::Serialize;

/// Reads project role assignments
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the role that `user_id` has in `project_id`
    ///
    /// Implementations must return [`Error::ObjectNotFound`] if the user has
    /// no role in the project and some other variant for any other failure.
    async fn read_project_role(
        &self,
        project_id: u64,
        user_id: u64,
    ) -> LookupResult<ProjectRole>;
}

/// Reads custom policies
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Returns the custom policy `uid` in `project_id`
    ///
    /// Implementations must return [`Error::ObjectNotFound`] if there is no
    /// such policy and some other variant for any other failure.
    async fn read_policy(
        &self,
        project_id: u64,
        uid: &str,
    ) -> LookupResult<StoredPolicy>;
}

/// A custom policy as it's stored
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StoredPolicy {
    pub project_id: u64,
    pub uid: String,
    pub name: String,
    pub created_by_user_id: u64,
    /// JSON-encoded list of [`PolicyDocument`]s
    pub policy_bytes: Vec<u8>,
}

impl StoredPolicy {
    /// Encodes `documents` for storage
    pub fn new(
        project_id: u64,
        uid: &str,
        name: &str,
        created_by_user_id: u64,
        documents: &[PolicyDocument],
    ) -> Result<StoredPolicy, Error> {
        let policy_bytes = serde_json::to_vec(documents)?;
        Ok(StoredPolicy {
            project_id,
            uid: uid.to_string(),
            name: name.to_string(),
            created_by_user_id,
            policy_bytes,
        })
    }

    /// Decodes the stored documents
    ///
    /// Failure here means the row is corrupt or was written by an
    /// incompatible version.
    pub fn to_api_policy(&self) -> Result<ApiPolicy, PolicyConversionError> {
        let policy: Vec<PolicyDocument> =
            serde_json::from_slice(&self.policy_bytes)?;
        validate_documents(&policy)?;
        Ok(ApiPolicy { uid: self.uid.clone(), name: self.name.clone(), policy })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyConversionError {
    #[error("failed to parse stored policy documents")]
    Parse(#[from] serde_json::Error),
    #[error("stored policy documents are invalid")]
    Invalid(#[from] PolicyValidationError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::DEVELOPER_POLICY;
    use assert_matches::assert_matches;

    #[test]
    fn test_stored_policy_conversion() {
        let stored =
            StoredPolicy::new(7, "deployers", "Deployers", 42, &DEVELOPER_POLICY)
                .unwrap();
        let api_policy = stored.to_api_policy().unwrap();
        assert_eq!(api_policy.uid, "deployers");
        assert_eq!(api_policy.name, "Deployers");
        assert_eq!(api_policy.policy, *DEVELOPER_POLICY);
    }

    #[test]
    fn test_corrupt_stored_policy() {
        let mut stored = StoredPolicy::new(7, "deployers", "Deployers", 42, &[])
            .unwrap();
        stored.policy_bytes = b"{\"scope\": ".to_vec();
        assert_matches!(
            stored.to_api_policy(),
            Err(PolicyConversionError::Parse(_))
        );

        stored.policy_bytes = br#"[{
            "scope": "project",
            "verbs": ["read"],
            "children": { "release": { "scope": "release", "verbs": [] } }
        }]"#
        .to_vec();
        assert_matches!(
            stored.to_api_policy(),
            Err(PolicyConversionError::Invalid(_))
        );
    }
}
