//! Authorization primitives for the HR module.
//!
//! [`resolve`] is the single decision point: it compares the caller's role
//! rank and department against a route's [`PolicyDeclaration`] and either
//! admits the request with a data-visibility [`Scope`] or denies it with an
//! [`AuthzError`]. It performs no I/O; handlers apply the scope themselves.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Role name that bypasses rank and department checks.
pub const ADMIN_ROLE: &str = "admin";

/// Policy department value accepting callers from any department.
pub const ANY_DEPARTMENT: &str = "*";

/// Lowest rank a role may carry and the default policy requirement.
pub const MIN_RANK: i32 = 1;

/// Outcome of [`resolve`].
pub type Decision = Result<Scope, AuthzError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthorized")]
    Unauthenticated,
    #[error("role rank {actual} is below required rank {required}")]
    InsufficientRank { required: i32, actual: i32 },
    #[error("department {actual} does not match required department {required}")]
    DepartmentMismatch { required: String, actual: String },
}

impl AuthzError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::Unauthenticated => "UNAUTHENTICATED",
            AuthzError::InsufficientRank { .. } => "INSUFFICIENT_RANK",
            AuthzError::DepartmentMismatch { .. } => "DEPARTMENT_MISMATCH",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("minimum role rank must be at least {MIN_RANK}, got {0}")]
    InvalidRank(i32),
    #[error("department must be a name or \"*\"")]
    EmptyDepartment,
    #[error("unknown scope {0:?}, expected self, department or all")]
    UnknownScope(String),
}

/// How much data an admitted caller may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only records owned by the caller.
    #[serde(rename = "self")]
    Own,
    /// Records within the caller's department.
    Department,
    /// No restriction.
    All,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Own => "self",
            Scope::Department => "department",
            Scope::All => "all",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self" => Ok(Scope::Own),
            "department" => Ok(Scope::Department),
            "all" => Ok(Scope::All),
            _ => Err(PolicyError::UnknownScope(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: Uuid,
    pub name: String,
    pub rank: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

/// The authenticated caller as loaded by the identity store.
///
/// `role` and `department` are optional because the underlying foreign keys
/// are nullable; [`resolve`] treats a principal lacking either as
/// unauthenticated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Option<RoleRef>,
    pub department: Option<DepartmentRef>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_ref()
            .is_some_and(|role| same_name(&role.name, ADMIN_ROLE))
    }

    pub fn department_id(&self) -> Option<Uuid> {
        self.department.as_ref().map(|dept| dept.id)
    }
}

/// Per-route access requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDeclaration {
    pub scope: Scope,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_min_rank", rename = "minRoleRank", alias = "min_role_rank")]
    pub min_role_rank: i32,
}

fn default_department() -> String {
    ANY_DEPARTMENT.to_string()
}

fn default_min_rank() -> i32 {
    MIN_RANK
}

impl PolicyDeclaration {
    /// Policy granting `scope` to any authenticated caller.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            department: default_department(),
            min_role_rank: default_min_rank(),
        }
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn min_rank(mut self, rank: i32) -> Self {
        self.min_role_rank = rank;
        self
    }

    pub fn is_any_department(&self) -> bool {
        self.department == ANY_DEPARTMENT
    }

    /// Checks the declaration once at startup; [`resolve`] assumes it holds.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_role_rank < MIN_RANK {
            return Err(PolicyError::InvalidRank(self.min_role_rank));
        }
        if self.department.trim().is_empty() {
            return Err(PolicyError::EmptyDepartment);
        }
        Ok(())
    }
}

/// Admitted caller together with the scope handlers must apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessGrant {
    pub principal: Principal,
    pub scope: Scope,
}

/// Decides whether `principal` may pass `policy`.
///
/// Checks run in a fixed order: completeness of the principal, the admin
/// override (always [`Scope::All`]), minimum rank (equal rank passes), then
/// the department restriction unless the policy uses [`ANY_DEPARTMENT`].
pub fn resolve(principal: &Principal, policy: &PolicyDeclaration) -> Decision {
    let (Some(role), Some(department)) = (&principal.role, &principal.department) else {
        return Err(AuthzError::Unauthenticated);
    };

    if same_name(&role.name, ADMIN_ROLE) {
        return Ok(Scope::All);
    }

    if role.rank < policy.min_role_rank {
        return Err(AuthzError::InsufficientRank {
            required: policy.min_role_rank,
            actual: role.rank,
        });
    }

    if !policy.is_any_department() && !same_name(&department.name, &policy.department) {
        return Err(AuthzError::DepartmentMismatch {
            required: policy.department.clone(),
            actual: department.name.clone(),
        });
    }

    Ok(policy.scope)
}

/// Resolves and pairs the principal with its scope.
pub fn grant(principal: Principal, policy: &PolicyDeclaration) -> Result<AccessGrant, AuthzError> {
    let scope = resolve(&principal, policy)?;
    Ok(AccessGrant { principal, scope })
}

fn same_name(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
