//! Error types.
//!
//! Access decisions never fail; these cover construction-time validation only.

/// Approval rule catalog validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two rules share a uid. The uid is the only join key between
    /// classification outcomes and rules, so this is rejected.
    #[error("duplicate approval rule uid: {uid}")]
    DuplicateUid {
        /// The repeated uid.
        uid: String,
    },
}

/// Workspace snapshot validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    /// Two policies share a name.
    #[error("duplicate policy name: {name}")]
    DuplicatePolicy {
        /// The repeated policy name.
        name: String,
    },

    /// Two users share an email.
    #[error("duplicate user: {email}")]
    DuplicateUser {
        /// The repeated email.
        email: String,
    },
}
