//! In-memory workspace snapshot backing the access collaborators.
//!
//! A [`WorkspaceSnapshot`] is the serialized form (the `[workspace]` table of
//! the config file); [`Workspace`] is the validated, indexed form and
//! implements [`PolicyStore`], [`FeatureGate`] and [`QueryAllowList`].

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::access::{AccessGate, FeatureGate, PolicyStore, QueryAllowList};
use crate::error::WorkspaceError;
use crate::policy::IamPolicy;
use crate::types::{Database, Instance, Principal, Role};

/// A workspace member and their explicit grants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserEntry {
    /// Login identity.
    pub email: String,
    /// Workspace role.
    pub role: Role,
    /// Databases the user may query, as `instances/{instance}/databases/{database}`.
    #[serde(default)]
    pub grants: Vec<String>,
}

/// Serialized workspace state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceSnapshot {
    /// Feature flags enabled workspace-wide.
    pub features: Vec<String>,
    /// Feature flags enabled per instance name.
    pub instance_features: HashMap<String, Vec<String>>,
    /// Loaded IAM policies.
    pub policies: Vec<IamPolicy>,
    /// Workspace members.
    pub users: Vec<UserEntry>,
}

/// Validated workspace state.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    features: HashSet<String>,
    instance_features: HashMap<String, HashSet<String>>,
    policies: HashMap<String, IamPolicy>,
    users: HashMap<String, UserEntry>,
}

impl Workspace {
    /// Index a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] if policy names or user emails repeat.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Result<Self, WorkspaceError> {
        let mut policies = HashMap::with_capacity(snapshot.policies.len());
        for policy in snapshot.policies {
            if policies.contains_key(&policy.name) {
                return Err(WorkspaceError::DuplicatePolicy { name: policy.name });
            }
            policies.insert(policy.name.clone(), policy);
        }

        let mut users = HashMap::with_capacity(snapshot.users.len());
        for user in snapshot.users {
            if users.contains_key(&user.email) {
                return Err(WorkspaceError::DuplicateUser { email: user.email });
            }
            users.insert(user.email.clone(), user);
        }

        let instance_features = snapshot
            .instance_features
            .into_iter()
            .map(|(instance, flags)| (instance, flags.into_iter().collect()))
            .collect();

        Ok(Self {
            features: snapshot.features.into_iter().collect(),
            instance_features,
            policies,
            users,
        })
    }

    /// Principal for a workspace member.
    pub fn principal(&self, email: &str) -> Option<Principal> {
        self.users
            .get(email)
            .map(|u| Principal::new(u.email.clone(), u.role))
    }

    /// Access gate backed by this workspace.
    pub fn gate(&self) -> AccessGate<'_> {
        AccessGate::new(self, self, self)
    }
}

impl PolicyStore for Workspace {
    fn get_policy_by_name(&self, name: &str) -> Option<&IamPolicy> {
        self.policies.get(name)
    }
}

impl FeatureGate for Workspace {
    fn has_feature(&self, flag: &str) -> bool {
        self.features.contains(flag)
    }

    fn has_instance_feature(&self, flag: &str, instance: &Instance) -> bool {
        self.has_feature(flag)
            || self
                .instance_features
                .get(&instance.name)
                .is_some_and(|flags| flags.contains(flag))
    }
}

impl QueryAllowList for Workspace {
    fn allow_to_query(&self, principal: &Principal, database: &Database) -> bool {
        let resource = database.resource_name();
        self.users
            .get(&principal.email)
            .is_some_and(|u| u.grants.iter().any(|g| *g == resource))
    }
}
