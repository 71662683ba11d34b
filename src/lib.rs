//! dbguard — database access decisions and approval-rule reconciliation.
//!
//! Two independent consumers of the same expression representation:
//!
//! ```text
//! Expr ──► extract_scope_values ──► evaluate_access / can_access
//!
//! LocalApprovalRule[] + ParsedApprovalRule[] + UnrecognizedApprovalRule[]
//!                      ──► resolve ──► ApprovalConfig
//! ```
//!
//! Every entry point is a pure function over borrowed inputs; collaborators
//! (policy store, allow-list, feature gate) are passed in explicitly.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod approval;
pub mod config;
pub mod error;
pub mod expr;
pub mod logging;
pub mod policy;
pub mod types;
pub mod workspace;

pub use access::{
    can_access, check_access, evaluate_access, AccessDecision, AccessGate, FeatureGate,
    GrantReason, PolicyStore, QueryAllowList,
};
pub use approval::{resolve, ApprovalConfig, RuleCatalog};
pub use error::{CatalogError, WorkspaceError};
pub use expr::{extract_scope_values, Expr, ScopeValues};
