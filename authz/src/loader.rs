// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loading the policy documents that apply to a caller
//!
//! A caller is identified in one of two ways:
//!
//! * by an API token, which names a policy by UID.  The UID is either one of
//!   the reserved canned policies or a custom policy created in the token's
//!   project.
//! * by a user in a project.  The user's role in that project selects one of
//!   the canned policies.
//!
//! Every outcome other than success is one of three [`Error`] variants:
//!
//! * [`Error::Forbidden`]: the caller has no standing here (no role in the
//!   project, a role kind we don't authorize, or no usable identity at all)
//! * [`Error::InvalidRequest`]: a token names a custom policy that doesn't
//!   exist.  That's a configuration mistake by the caller, not a denial.
//! * [`Error::InternalError`]: storage failed or returned data we can't use.
//!   The details are logged here; the HTTP layer doesn't show them to the
//!   client.
//!
//! Nothing is cached.  Each call reads the current role or stored policy.

use crate::catalog::CannedPolicy;
use crate::policy::ApiPolicy;
use crate::policy::PolicyDocument;
use crate::role::RoleKind;
use crate::storage::PolicyStore;
use crate::storage::RoleStore;
use berth_common::api::external::Error;
use serde::Deserialize;
use serde::Serialize;
use slog::debug;
use slog::error;
use slog::info;
use slog::o;
use slog::Logger;
use std::sync::Arc;

/// The parts of an API token that policy loading needs
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ApiToken {
    pub name: String,
    pub project_id: u64,
    pub policy_uid: String,
}

/// Identifies the caller whose policy documents should be loaded
///
/// If `token` is present, it wins.  Otherwise both `project_id` and `user_id`
/// must be non-zero.  The default value identifies nobody and is always
/// rejected.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PolicyLoaderOpts {
    pub project_id: u64,
    pub user_id: u64,
    pub token: Option<ApiToken>,
}

impl PolicyLoaderOpts {
    pub fn for_user(project_id: u64, user_id: u64) -> PolicyLoaderOpts {
        PolicyLoaderOpts { project_id, user_id, token: None }
    }

    pub fn for_token(token: ApiToken) -> PolicyLoaderOpts {
        PolicyLoaderOpts { project_id: 0, user_id: 0, token: Some(token) }
    }
}

impl CannedPolicy {
    fn for_role(kind: RoleKind) -> CannedPolicy {
        match kind {
            RoleKind::Admin => CannedPolicy::Admin,
            RoleKind::Developer => CannedPolicy::Developer,
            RoleKind::Viewer => CannedPolicy::Viewer,
        }
    }
}

/// Resolves a caller to the policy documents that apply to them
#[async_trait::async_trait]
pub trait PolicyDocumentLoader: Send + Sync {
    async fn load_policy_documents(
        &self,
        opts: &PolicyLoaderOpts,
    ) -> Result<Vec<PolicyDocument>, Error>;
}

/// Loads policy documents using the role and policy stores
pub struct RepoPolicyDocumentLoader {
    log: Logger,
    roles: Arc<dyn RoleStore>,
    policies: Arc<dyn PolicyStore>,
}

impl RepoPolicyDocumentLoader {
    pub fn new(
        log: &Logger,
        roles: Arc<dyn RoleStore>,
        policies: Arc<dyn PolicyStore>,
    ) -> RepoPolicyDocumentLoader {
        RepoPolicyDocumentLoader {
            log: log.new(o!("component" => "PolicyDocumentLoader")),
            roles,
            policies,
        }
    }

    /// Returns the policy with UID `uid` in project `project_id`
    pub async fn resolve_policy_by_uid(
        &self,
        project_id: u64,
        uid: &str,
    ) -> Result<ApiPolicy, Error> {
        resolve_policy_by_uid(&self.log, &*self.policies, project_id, uid)
            .await
    }

    async fn load_for_user(
        &self,
        project_id: u64,
        user_id: u64,
    ) -> Result<Vec<PolicyDocument>, Error> {
        let log = self.log.new(o!(
            "project_id" => project_id,
            "user_id" => user_id,
        ));

        let role = match self.roles.read_project_role(project_id, user_id).await
        {
            Ok(role) => role,
            Err(Error::ObjectNotFound { .. }) => {
                info!(log, "denying policy load: no project role");
                return Err(Error::forbidden(&format!(
                    "user {} does not have a role in project {}",
                    user_id, project_id
                )));
            }
            Err(e) => {
                error!(log, "failed to read project role"; "error" => %e);
                return Err(Error::internal_error(&format!(
                    "reading role for user {} in project {}: {}",
                    user_id, project_id, e
                )));
            }
        };

        let kind = match RoleKind::from_database_string(&role.kind) {
            Ok(kind) => kind,
            Err(e) => {
                info!(log, "denying policy load"; "reason" => %e);
                return Err(Error::forbidden(&format!(
                    "{} role not supported for user {}, project {}",
                    role.kind, user_id, project_id
                )));
            }
        };

        let canned = CannedPolicy::for_role(kind);
        debug!(log, "loaded role policy"; "policy" => canned.uid());
        Ok(canned.documents().to_vec())
    }
}

#[async_trait::async_trait]
impl PolicyDocumentLoader for RepoPolicyDocumentLoader {
    async fn load_policy_documents(
        &self,
        opts: &PolicyLoaderOpts,
    ) -> Result<Vec<PolicyDocument>, Error> {
        if let Some(token) = &opts.token {
            let api_policy = self
                .resolve_policy_by_uid(token.project_id, &token.policy_uid)
                .await?;
            return Ok(api_policy.policy);
        }

        if opts.project_id != 0 && opts.user_id != 0 {
            return self.load_for_user(opts.project_id, opts.user_id).await;
        }

        info!(self.log, "policy loader called with invalid arguments";
            "project_id" => opts.project_id,
            "user_id" => opts.user_id,
        );
        Err(Error::forbidden("policy loader called with invalid arguments"))
    }
}

/// Returns the policy with UID `uid` in project `project_id`
///
/// The canned policy UIDs are answered without consulting `policies`.
pub async fn resolve_policy_by_uid(
    log: &Logger,
    policies: &dyn PolicyStore,
    project_id: u64,
    uid: &str,
) -> Result<ApiPolicy, Error> {
    let log = log.new(o!(
        "project_id" => project_id,
        "policy_uid" => uid.to_string(),
    ));

    if let Some(canned) = CannedPolicy::from_uid(uid) {
        debug!(log, "loaded canned policy");
        return Ok(canned.api_policy());
    }

    let stored = match policies.read_policy(project_id, uid).await {
        Ok(stored) => stored,
        Err(Error::ObjectNotFound { .. }) => {
            info!(log, "token references a missing policy");
            return Err(Error::invalid_request("policy not found in project"));
        }
        Err(e) => {
            error!(log, "failed to read policy"; "error" => %e);
            return Err(Error::internal_error(&format!(
                "reading policy {:?} in project {}: {}",
                uid, project_id, e
            )));
        }
    };

    stored.to_api_policy().map_err(|e| {
        error!(log, "failed to convert stored policy";
            "error" => %e,
            "cause" => ?std::error::Error::source(&e),
        );
        Error::internal_error(&format!(
            "converting policy {:?} in project {}: {}",
            uid, project_id, e
        ))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::ADMIN_POLICY;
    use crate::catalog::DEVELOPER_POLICY;
    use crate::catalog::VIEWER_POLICY;
    use crate::memory::InMemoryStore;
    use crate::role::ProjectRole;
    use crate::scope::read_verb_group;
    use crate::scope::read_write_verb_group;
    use crate::scope::Scope;
    use crate::storage::StoredPolicy;
    use assert_matches::assert_matches;
    use berth_common::api::external::LookupResult;
    use berth_test_utils::dev;

    /// A store whose every read fails the way a lost database connection
    /// would
    struct UnavailableStore;

    #[async_trait::async_trait]
    impl RoleStore for UnavailableStore {
        async fn read_project_role(
            &self,
            _project_id: u64,
            _user_id: u64,
        ) -> LookupResult<ProjectRole> {
            Err(Error::internal_error("connection reset by peer"))
        }
    }

    #[async_trait::async_trait]
    impl PolicyStore for UnavailableStore {
        async fn read_policy(
            &self,
            _project_id: u64,
            _uid: &str,
        ) -> LookupResult<StoredPolicy> {
            // Not every failure is an InternalError.  Whatever it is, it's not
            // the caller's fault.
            Err(Error::forbidden("storage credentials expired"))
        }
    }

    /// Records each log message with the keys attached to it
    #[derive(Clone, Default)]
    struct CapturingDrain {
        records: Arc<std::sync::Mutex<Vec<(String, Vec<String>)>>>,
    }

    struct KeyCollector(Vec<String>);

    impl slog::Serializer for KeyCollector {
        fn emit_arguments(
            &mut self,
            key: slog::Key,
            _val: &std::fmt::Arguments,
        ) -> slog::Result {
            self.0.push(key.to_string());
            Ok(())
        }
    }

    impl slog::Drain for CapturingDrain {
        type Ok = ();
        type Err = slog::Never;

        fn log(
            &self,
            record: &slog::Record,
            values: &slog::OwnedKVList,
        ) -> Result<(), slog::Never> {
            let mut keys = KeyCollector(Vec::new());
            slog::KV::serialize(values, record, &mut keys).unwrap();
            slog::KV::serialize(&record.kv(), record, &mut keys).unwrap();
            self.records
                .lock()
                .unwrap()
                .push((record.msg().to_string(), keys.0));
            Ok(())
        }
    }

    fn loader_for(
        log: &Logger,
        store: &Arc<InMemoryStore>,
    ) -> RepoPolicyDocumentLoader {
        RepoPolicyDocumentLoader::new(log, store.clone(), store.clone())
    }

    fn token(project_id: u64, policy_uid: &str) -> PolicyLoaderOpts {
        PolicyLoaderOpts::for_token(ApiToken {
            name: String::from("ci"),
            project_id,
            policy_uid: policy_uid.to_string(),
        })
    }

    #[tokio::test]
    async fn test_role_policies() {
        let logctx = dev::test_setup_log("test_role_policies");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 1, "admin");
        store.set_project_role(7, 2, "developer");
        store.set_project_role(7, 3, "viewer");
        let loader = loader_for(&logctx.log, &store);

        let expected = [
            (1, &*ADMIN_POLICY),
            (2, &*DEVELOPER_POLICY),
            (3, &*VIEWER_POLICY),
        ];
        for (user_id, policy) in expected {
            let documents = loader
                .load_policy_documents(&PolicyLoaderOpts::for_user(7, user_id))
                .await
                .unwrap();
            assert_eq!(&documents, policy);
        }

        // Role-based loading never looks at custom policies.
        assert_eq!(store.policy_reads(), 0);
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_developer_example() {
        let logctx = dev::test_setup_log("test_developer_example");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 42, "developer");
        let loader = loader_for(&logctx.log, &store);

        let documents = loader
            .load_policy_documents(&PolicyLoaderOpts::for_user(7, 42))
            .await
            .unwrap();
        let [project] = documents.as_slice() else {
            panic!("expected one document, found {:?}", documents);
        };
        assert_eq!(project.scope(), Scope::Project);
        assert_eq!(project.verbs(), &read_write_verb_group());
        assert_eq!(project.children().len(), 1);
        let settings = project.child(Scope::Settings).unwrap();
        assert_eq!(settings.scope(), Scope::Settings);
        assert_eq!(settings.verbs(), &read_verb_group());
        assert!(settings.children().is_empty());
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_no_role_is_forbidden() {
        let logctx = dev::test_setup_log("test_no_role_is_forbidden");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(8, 42, "admin");
        let loader = loader_for(&logctx.log, &store);

        let error = loader
            .load_policy_documents(&PolicyLoaderOpts::for_user(7, 42))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            Error::forbidden("user 42 does not have a role in project 7")
        );
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_unsupported_role_is_forbidden() {
        let logctx = dev::test_setup_log("test_unsupported_role_is_forbidden");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 42, "billing");
        let loader = loader_for(&logctx.log, &store);

        let error = loader
            .load_policy_documents(&PolicyLoaderOpts::for_user(7, 42))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            Error::forbidden("billing role not supported for user 42, project 7")
        );
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_role_store_failure_is_internal() {
        let logctx = dev::test_setup_log("test_role_store_failure_is_internal");
        let store = Arc::new(UnavailableStore);
        let loader = RepoPolicyDocumentLoader::new(
            &logctx.log,
            store.clone(),
            store.clone(),
        );

        let error = loader
            .load_policy_documents(&PolicyLoaderOpts::for_user(7, 42))
            .await
            .unwrap_err();
        assert_matches!(error, Error::InternalError { internal_message } => {
            assert!(internal_message.contains("connection reset by peer"));
        });
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_forbidden() {
        let logctx = dev::test_setup_log("test_invalid_arguments_are_forbidden");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 42, "admin");
        let loader = loader_for(&logctx.log, &store);

        for opts in [
            PolicyLoaderOpts::default(),
            PolicyLoaderOpts::for_user(7, 0),
            PolicyLoaderOpts::for_user(0, 42),
        ] {
            let error = loader.load_policy_documents(&opts).await.unwrap_err();
            assert_eq!(
                error,
                Error::forbidden("policy loader called with invalid arguments")
            );
        }
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_canned_token_skips_storage() {
        let logctx = dev::test_setup_log("test_canned_token_skips_storage");
        let store = Arc::new(InMemoryStore::new());
        let loader = loader_for(&logctx.log, &store);

        for canned in [
            CannedPolicy::Admin,
            CannedPolicy::Developer,
            CannedPolicy::Viewer,
        ] {
            let documents = loader
                .load_policy_documents(&token(7, canned.uid()))
                .await
                .unwrap();
            assert_eq!(documents, canned.documents());

            let api_policy =
                loader.resolve_policy_by_uid(7, canned.uid()).await.unwrap();
            assert_eq!(api_policy.uid, canned.uid());
            assert_eq!(api_policy.name, canned.uid());
        }
        assert_eq!(store.policy_reads(), 0);

        // Even a store that can't answer anything is fine for canned UIDs.
        let loader = RepoPolicyDocumentLoader::new(
            &logctx.log,
            Arc::new(UnavailableStore),
            Arc::new(UnavailableStore),
        );
        let documents =
            loader.load_policy_documents(&token(7, "admin")).await.unwrap();
        assert_eq!(documents, *ADMIN_POLICY);
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_canned_token_is_logged() {
        let drain = CapturingDrain::default();
        let log = Logger::root(drain.clone(), o!());
        let store = Arc::new(InMemoryStore::new());
        let loader = loader_for(&log, &store);

        loader.load_policy_documents(&token(7, "viewer")).await.unwrap();

        let records = drain.records.lock().unwrap();
        let (_, keys) = records
            .iter()
            .find(|(msg, _)| msg == "loaded canned policy")
            .expect("no log record for the canned policy");
        assert!(keys.iter().any(|k| k == "policy_uid"), "keys: {:?}", keys);
        assert!(keys.iter().any(|k| k == "project_id"), "keys: {:?}", keys);
    }

    #[tokio::test]
    async fn test_token_wins_over_user() {
        let logctx = dev::test_setup_log("test_token_wins_over_user");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 42, "admin");
        let loader = loader_for(&logctx.log, &store);

        let mut opts = token(7, "viewer");
        opts.project_id = 7;
        opts.user_id = 42;
        let documents = loader.load_policy_documents(&opts).await.unwrap();
        assert_eq!(documents, *VIEWER_POLICY);
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_custom_policy() {
        let logctx = dev::test_setup_log("test_custom_policy");
        let store = Arc::new(InMemoryStore::new());
        let documents = vec![PolicyDocument::new(
            Scope::Project,
            read_verb_group(),
        )
        .with_child(
            PolicyDocument::new(Scope::Cluster, read_write_verb_group())
                .with_resources(["3"]),
        )];
        store
            .create_policy(7, "deployers", "Cluster 3 deployers", 42, &documents)
            .unwrap();
        let loader = loader_for(&logctx.log, &store);

        let loaded =
            loader.load_policy_documents(&token(7, "deployers")).await.unwrap();
        assert_eq!(loaded, documents);

        let api_policy =
            loader.resolve_policy_by_uid(7, "deployers").await.unwrap();
        assert_eq!(api_policy.name, "Cluster 3 deployers");
        assert_eq!(store.policy_reads(), 2);

        // The token's project scopes the lookup.
        let error = loader
            .load_policy_documents(&token(8, "deployers"))
            .await
            .unwrap_err();
        assert_eq!(error, Error::invalid_request("policy not found in project"));
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_missing_custom_policy_is_client_error() {
        let logctx =
            dev::test_setup_log("test_missing_custom_policy_is_client_error");
        let store = Arc::new(InMemoryStore::new());
        let loader = loader_for(&logctx.log, &store);

        let error = loader
            .load_policy_documents(&token(7, "no-such-policy"))
            .await
            .unwrap_err();
        assert_matches!(error, Error::InvalidRequest { .. });
        assert_eq!(store.policy_reads(), 1);
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_corrupt_custom_policy_is_internal() {
        let logctx =
            dev::test_setup_log("test_corrupt_custom_policy_is_internal");
        let store = Arc::new(InMemoryStore::new());
        store.insert_raw_policy(StoredPolicy {
            project_id: 7,
            uid: String::from("truncated"),
            name: String::from("truncated"),
            created_by_user_id: 42,
            policy_bytes: b"[{\"scope\": \"proj".to_vec(),
        });
        store.insert_raw_policy(StoredPolicy {
            project_id: 7,
            uid: String::from("future"),
            name: String::from("future"),
            created_by_user_id: 42,
            policy_bytes: br#"[{"scope": "galaxy", "verbs": []}]"#.to_vec(),
        });
        let loader = loader_for(&logctx.log, &store);

        for uid in ["truncated", "future"] {
            let error =
                loader.load_policy_documents(&token(7, uid)).await.unwrap_err();
            assert_matches!(error, Error::InternalError { .. }, "uid {}", uid);
        }
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_policy_store_failure_is_internal() {
        let logctx =
            dev::test_setup_log("test_policy_store_failure_is_internal");
        let loader = RepoPolicyDocumentLoader::new(
            &logctx.log,
            Arc::new(UnavailableStore),
            Arc::new(UnavailableStore),
        );

        let error = loader
            .load_policy_documents(&token(7, "deployers"))
            .await
            .unwrap_err();
        assert_matches!(error, Error::InternalError { .. });
        logctx.cleanup_successful();
    }

    #[tokio::test]
    async fn test_repeated_loads() {
        let logctx = dev::test_setup_log("test_repeated_loads");
        let store = Arc::new(InMemoryStore::new());
        store.set_project_role(7, 42, "viewer");
        let loader = loader_for(&logctx.log, &store);
        let opts = PolicyLoaderOpts::for_user(7, 42);

        let first = loader.load_policy_documents(&opts).await.unwrap();
        let second = loader.load_policy_documents(&opts).await.unwrap();
        assert_eq!(first, second);

        // Nothing is cached: a role change shows up on the next load.
        store.set_project_role(7, 42, "admin");
        let third = loader.load_policy_documents(&opts).await.unwrap();
        assert_eq!(third, *ADMIN_POLICY);

        store.remove_project_role(7, 42);
        assert_matches!(
            loader.load_policy_documents(&opts).await,
            Err(Error::Forbidden { .. })
        );
        logctx.cleanup_successful();
    }
}
