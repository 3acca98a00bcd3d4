use std::path::Path;

use anyhow::{Context, Result};
use platform_authz::{PolicyDeclaration, Scope};
use serde::Deserialize;

const HR_DEPARTMENT: &str = "hr";

/// Access requirement for every guarded endpoint.
///
/// A policies file may override any subset of entries; omitted entries keep
/// their defaults and omitted fields inside an entry fall back to
/// `department = "*"` and `minRoleRank = 1`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RoutePolicies {
    pub list_users: PolicyDeclaration,
    pub current_user: PolicyDeclaration,
    pub get_user: PolicyDeclaration,
    pub create_user: PolicyDeclaration,
    pub update_user: PolicyDeclaration,
    pub delete_user: PolicyDeclaration,
    pub read_roles: PolicyDeclaration,
    pub create_role: PolicyDeclaration,
    pub read_departments: PolicyDeclaration,
    pub create_department: PolicyDeclaration,
}

impl Default for RoutePolicies {
    fn default() -> Self {
        Self {
            list_users: PolicyDeclaration::new(Scope::Department),
            current_user: PolicyDeclaration::new(Scope::Own),
            get_user: PolicyDeclaration::new(Scope::Department),
            create_user: PolicyDeclaration::new(Scope::All)
                .department(HR_DEPARTMENT)
                .min_rank(50),
            update_user: PolicyDeclaration::new(Scope::All)
                .department(HR_DEPARTMENT)
                .min_rank(50),
            delete_user: PolicyDeclaration::new(Scope::All)
                .department(HR_DEPARTMENT)
                .min_rank(75),
            read_roles: PolicyDeclaration::new(Scope::All),
            create_role: PolicyDeclaration::new(Scope::All).min_rank(100),
            read_departments: PolicyDeclaration::new(Scope::All),
            create_department: PolicyDeclaration::new(Scope::All).min_rank(75),
        }
    }
}

impl RoutePolicies {
    /// Defaults, optionally overlaid with a JSON file, validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let policies = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_json(&raw).with_context(|| format!("invalid policies in {}", path.display()))?
            }
            None => Self::default(),
        };
        policies.validate()?;
        Ok(policies)
    }

    fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (route, policy) in self.entries() {
            policy
                .validate()
                .with_context(|| format!("policy for {route}"))?;
        }
        Ok(())
    }

    pub fn entries(&self) -> [(&'static str, &PolicyDeclaration); 10] {
        [
            ("GET /api/users", &self.list_users),
            ("GET /api/users/me", &self.current_user),
            ("GET /api/users/{id}", &self.get_user),
            ("POST /api/users", &self.create_user),
            ("PATCH /api/users/{id}", &self.update_user),
            ("DELETE /api/users/{id}", &self.delete_user),
            ("GET /api/roles[/{id}]", &self.read_roles),
            ("POST /api/roles", &self.create_role),
            ("GET /api/departments[/{id}]", &self.read_departments),
            ("POST /api/departments", &self.create_department),
        ]
    }

    /// Plain-text table for the `policies` command.
    pub fn render(&self) -> String {
        let mut out = format!("{:<30} {:<11} {:<12} {}\n", "ROUTE", "SCOPE", "DEPARTMENT", "MIN RANK");
        for (route, policy) in self.entries() {
            out.push_str(&format!(
                "{:<30} {:<11} {:<12} {}\n",
                route, policy.scope, policy.department, policy.min_role_rank
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RoutePolicies::default().validate().unwrap();
    }

    #[test]
    fn user_writes_are_restricted_to_hr() {
        let policies = RoutePolicies::default();
        assert_eq!(policies.create_user.department, "hr");
        assert_eq!(policies.delete_user.min_role_rank, 75);
        assert!(policies.list_users.is_any_department());
        assert_eq!(policies.current_user.scope, Scope::Own);
    }

    #[test]
    fn file_overrides_merge_with_defaults() {
        let policies = RoutePolicies::from_json(
            r#"{ "listUsers": { "scope": "all", "minRoleRank": 10 }, "createRole": { "scope": "all", "department": "it" } }"#,
        )
        .unwrap();
        assert_eq!(policies.list_users.scope, Scope::All);
        assert_eq!(policies.list_users.min_role_rank, 10);
        assert!(policies.list_users.is_any_department());
        assert_eq!(policies.create_role.department, "it");
        assert_eq!(policies.create_role.min_role_rank, 1);
        assert_eq!(policies.delete_user, RoutePolicies::default().delete_user);
    }

    #[test]
    fn unknown_routes_and_bad_ranks_are_rejected() {
        assert!(RoutePolicies::from_json(r#"{ "listUser": { "scope": "all" } }"#).is_err());
        let zero = RoutePolicies::from_json(r#"{ "getUser": { "scope": "self", "minRoleRank": 0 } }"#)
            .unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn render_lists_every_route() {
        let table = RoutePolicies::default().render();
        assert_eq!(table.lines().count(), 11);
        assert!(table.contains("DELETE /api/users/{id}"));
    }
}
