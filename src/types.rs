//! Principals, protected databases, and connection kinds.

use serde::{Deserialize, Serialize};

/// Workspace role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular workspace member.
    Developer,
    /// Database administrator.
    Dba,
    /// Workspace owner.
    Owner,
}

/// Workspace-wide permissions derived from a [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspacePermission {
    /// `bb.permission.workspace.manage-access-control`: may access every database.
    ManageAccessControl,
    /// `bb.permission.workspace.manage-instance`: may use any data source.
    ManageInstance,
}

impl WorkspacePermission {
    /// Stable permission identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageAccessControl => "bb.permission.workspace.manage-access-control",
            Self::ManageInstance => "bb.permission.workspace.manage-instance",
        }
    }
}

impl Role {
    /// Whether this role carries the given workspace permission.
    pub fn has_permission(self, permission: WorkspacePermission) -> bool {
        match permission {
            WorkspacePermission::ManageAccessControl | WorkspacePermission::ManageInstance => {
                self >= Role::Dba
            }
        }
    }
}

/// Acting user. Immutable for the duration of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Login identity, e.g. an email address.
    pub email: String,
    /// Workspace role.
    pub role: Role,
}

impl Principal {
    /// Create a principal.
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
        }
    }
}

/// Lifecycle state shared by databases, instances and environments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// In use.
    #[default]
    Active,
    /// Soft-deleted.
    Deleted,
}

/// Environment an instance belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment identifier; this is the scope value access rules test.
    pub name: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
}

/// Database server instance hosting one or more databases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance identifier.
    pub name: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// Environment the instance is deployed in.
    pub environment: Environment,
}

/// The protected resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name, unique within its instance.
    pub name: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// Hosting instance.
    pub instance: Instance,
}

impl Database {
    /// Build an active database on an active instance in an active environment.
    pub fn new(
        name: impl Into<String>,
        instance: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state: State::Active,
            instance: Instance {
                name: instance.into(),
                state: State::Active,
                environment: Environment {
                    name: environment.into(),
                    state: State::Active,
                },
            },
        }
    }

    /// Environment identifier the database is scoped to.
    pub fn environment(&self) -> &str {
        &self.instance.environment.name
    }

    /// Resource name in `instances/{instance}/databases/{database}` form.
    pub fn resource_name(&self) -> String {
        format!("instances/{}/databases/{}", self.instance.name, self.name)
    }

    /// Whether the database, its instance, or the instance's environment is deleted.
    ///
    /// Archived databases are filtered out before access evaluation;
    /// [`crate::access::can_access`] does not look at this.
    pub fn is_archived(&self) -> bool {
        self.state == State::Deleted
            || self.instance.state == State::Deleted
            || self.instance.environment.state == State::Deleted
    }
}

/// Kind of data source a connection is made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSourceKind {
    /// System-owned administrative connection. Never subject to end-user access checks.
    Admin,
    /// Read-only end-user connection.
    ReadOnly,
}
