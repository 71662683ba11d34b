//! Database access decisions.
//!
//! [`evaluate_access`] runs a flat, short-circuiting chain; the first step
//! that grants wins, otherwise access is denied:
//!
//! ```text
//! 1. access-control feature disabled      -> granted (fail-open)
//! 2. role has manage-access-control       -> granted
//! 3. roles/QUERIER binding condition
//!    lists the database's environment     -> granted
//! 4. explicit per-database grant          -> granted / denied
//! ```
//!
//! Missing policies and missing bindings grant nothing and evaluation moves on.
//! Nothing here mutates its inputs, so decisions can be evaluated from many
//! threads against shared policy data.
//!
//! [`check_access`] is a separate guard for data-source connections: an
//! administrative connection is refused before any policy is consulted.

use serde::Serialize;

use crate::expr::extract_scope_values;
use crate::policy::{find_binding, IamPolicy, PolicyBinding, QUERIER_ROLE, WORKSPACE_IAM_POLICY};
use crate::types::{Database, DataSourceKind, Instance, Principal, WorkspacePermission};

/// Feature flag gating access control for the workspace.
pub const ACCESS_CONTROL_FEATURE: &str = "bb.feature.access-control";

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Read access to loaded IAM policies.
pub trait PolicyStore: Send + Sync {
    /// Look up a policy by name. `None` when no such policy is loaded.
    fn get_policy_by_name(&self, name: &str) -> Option<&IamPolicy>;
}

/// Per-database explicit query grants for a user.
pub trait QueryAllowList: Send + Sync {
    /// Whether `principal` has been explicitly granted query access to `database`.
    fn allow_to_query(&self, principal: &Principal, database: &Database) -> bool;
}

impl<F> QueryAllowList for F
where
    F: Fn(&Principal, &Database) -> bool + Send + Sync,
{
    fn allow_to_query(&self, principal: &Principal, database: &Database) -> bool {
        self(principal, database)
    }
}

/// Subscription feature checks.
pub trait FeatureGate: Send + Sync {
    /// Whether `flag` is enabled for the whole workspace.
    fn has_feature(&self, flag: &str) -> bool;

    /// Whether `flag` is enabled for a specific instance.
    ///
    /// Defaults to the workspace-wide answer.
    fn has_instance_feature(&self, flag: &str, _instance: &Instance) -> bool {
        self.has_feature(flag)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Which step of the chain granted access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    /// Access control is not enabled for the workspace.
    FeatureDisabled,
    /// The principal's role may access every database.
    SuperPrivilege,
    /// The querier binding's environment list contains the database's environment.
    QuerierBinding,
    /// The principal holds an explicit grant on the database.
    AllowList,
}

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Access granted, with the step that granted it.
    Granted(GrantReason),
    /// No step granted access.
    Denied,
}

impl AccessDecision {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Evaluate the access chain and report which step decided.
///
/// `bindings` are the bindings of the workspace IAM policy (empty when the
/// policy is absent). `allow_list` is only consulted when no earlier step
/// granted access.
pub fn evaluate_access(
    principal: &Principal,
    database: &Database,
    bindings: &[PolicyBinding],
    feature_enabled: bool,
    allow_list: &dyn QueryAllowList,
) -> AccessDecision {
    if !feature_enabled {
        tracing::debug!(database = %database.name, "access control disabled, allowing");
        return AccessDecision::Granted(GrantReason::FeatureDisabled);
    }

    if principal
        .role
        .has_permission(WorkspacePermission::ManageAccessControl)
    {
        tracing::debug!(
            user = %principal.email,
            role = ?principal.role,
            "super privilege grants access"
        );
        return AccessDecision::Granted(GrantReason::SuperPrivilege);
    }

    if let Some(binding) = find_binding(bindings, QUERIER_ROLE) {
        let environments = extract_scope_values(binding.condition_or_empty());
        if environments.contains(database.environment()) {
            tracing::debug!(
                user = %principal.email,
                environment = %database.environment(),
                condition = %binding.condition_or_empty(),
                "querier binding grants access"
            );
            return AccessDecision::Granted(GrantReason::QuerierBinding);
        }
    }

    if allow_list.allow_to_query(principal, database) {
        tracing::debug!(
            user = %principal.email,
            database = %database.resource_name(),
            "explicit grant allows access"
        );
        return AccessDecision::Granted(GrantReason::AllowList);
    }

    tracing::debug!(
        user = %principal.email,
        database = %database.resource_name(),
        "access denied"
    );
    AccessDecision::Denied
}

/// Whether `principal` may access `database`.
///
/// Boolean form of [`evaluate_access`].
pub fn can_access(
    principal: &Principal,
    database: &Database,
    bindings: &[PolicyBinding],
    feature_enabled: bool,
    allow_list: &dyn QueryAllowList,
) -> bool {
    evaluate_access(principal, database, bindings, feature_enabled, allow_list).is_granted()
}

/// Whether `principal` may use a `kind` data source on `database`.
///
/// Administrative data sources belong to the system and must never reach this
/// check; if one does, it is refused and a diagnostic is logged (an error with
/// a backtrace in debug builds, a warning in release builds). The decision is
/// `false` either way. Other kinds require the manage-instance permission.
pub fn check_access(database: &Database, principal: &Principal, kind: DataSourceKind) -> bool {
    if kind == DataSourceKind::Admin {
        if cfg!(debug_assertions) {
            tracing::error!(
                database = %database.resource_name(),
                user = %principal.email,
                backtrace = %std::backtrace::Backtrace::force_capture(),
                "should not check database access against ADMIN connection"
            );
        } else {
            tracing::warn!(
                database = %database.resource_name(),
                user = %principal.email,
                "should not check database access against ADMIN connection"
            );
        }
        return false;
    }

    principal
        .role
        .has_permission(WorkspacePermission::ManageInstance)
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Access checks wired to their collaborators.
///
/// Borrows the collaborators; holds no state of its own.
#[derive(Clone, Copy)]
pub struct AccessGate<'a> {
    policies: &'a dyn PolicyStore,
    allow_list: &'a dyn QueryAllowList,
    features: &'a dyn FeatureGate,
}

impl<'a> AccessGate<'a> {
    /// Create a gate over the given collaborators.
    pub fn new(
        policies: &'a dyn PolicyStore,
        allow_list: &'a dyn QueryAllowList,
        features: &'a dyn FeatureGate,
    ) -> Self {
        Self {
            policies,
            allow_list,
            features,
        }
    }

    /// Bindings of the workspace IAM policy, empty if the policy is absent.
    pub fn workspace_bindings(&self) -> &'a [PolicyBinding] {
        self.policies
            .get_policy_by_name(WORKSPACE_IAM_POLICY)
            .map(|p| p.bindings.as_slice())
            .unwrap_or(&[])
    }

    /// Evaluate the full chain for `principal` on `database`.
    pub fn evaluate(&self, principal: &Principal, database: &Database) -> AccessDecision {
        let feature_enabled = self.features.has_feature(ACCESS_CONTROL_FEATURE);
        evaluate_access(
            principal,
            database,
            self.workspace_bindings(),
            feature_enabled,
            self.allow_list,
        )
    }

    /// Whether `principal` may access `database`.
    pub fn can_access(&self, principal: &Principal, database: &Database) -> bool {
        self.evaluate(principal, database).is_granted()
    }

    /// Data-source guard; see [`check_access`].
    pub fn check_access(
        &self,
        database: &Database,
        principal: &Principal,
        kind: DataSourceKind,
    ) -> bool {
        check_access(database, principal, kind)
    }
}
