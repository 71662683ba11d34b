//! IAM policy bindings.
//!
//! A policy holds role bindings, each optionally restricted by a condition
//! expression. Lookups are first-match by role name: duplicate bindings for
//! the same role are kept as given and only the first one is consulted.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Name of the workspace IAM policy.
pub const WORKSPACE_IAM_POLICY: &str = "policies/WORKSPACE_IAM";

/// Role whose binding grants query access scoped by environment.
pub const QUERIER_ROLE: &str = "roles/QUERIER";

/// A (role, condition) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBinding {
    /// Role name, e.g. `roles/QUERIER`.
    pub role: String,
    /// Condition restricting the role. `None` behaves like [`Expr::Empty`].
    #[serde(default)]
    pub condition: Option<Expr>,
}

impl PolicyBinding {
    /// Create a binding with a condition.
    pub fn new(role: impl Into<String>, condition: Expr) -> Self {
        Self {
            role: role.into(),
            condition: Some(condition),
        }
    }

    /// The condition, or the zero-value expression when absent.
    pub fn condition_or_empty(&self) -> &Expr {
        static EMPTY: Expr = Expr::Empty;
        self.condition.as_ref().unwrap_or(&EMPTY)
    }
}

/// A named policy with its bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamPolicy {
    /// Policy name, e.g. `policies/WORKSPACE_IAM`.
    pub name: String,
    /// Bindings in declaration order.
    #[serde(default)]
    pub bindings: Vec<PolicyBinding>,
}

/// First binding whose role equals `role`.
pub fn find_binding<'a>(bindings: &'a [PolicyBinding], role: &str) -> Option<&'a PolicyBinding> {
    bindings.iter().find(|b| b.role == role)
}
