use entity::{department, role, user};
use platform_authz::ADMIN_ROLE;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait};

use crate::{
    HrError, HrResult, departments,
    departments::NewDepartment,
    roles,
    roles::NewRole,
    users::{self, NewUser, UserView},
};

/// Built-in roles as `(name, rank, description)`.
pub const DEFAULT_ROLES: &[(&str, i32, &str)] = &[
    (ADMIN_ROLE, 100, "Full administrative access"),
    ("director", 75, "Department director"),
    ("manager", 50, "Team manager"),
    ("staff", 10, "Regular employee"),
];

/// Departments created alongside the first administrator as `(name, code)`.
pub const DEFAULT_DEPARTMENTS: &[(&str, &str)] = &[("Administration", "ADMIN"), ("HR", "HR")];

#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Inserts any missing built-in role. Existing rows are left untouched.
pub async fn ensure_default_roles<C: ConnectionTrait>(db: &C) -> HrResult<Vec<role::Model>> {
    let mut seeded = Vec::with_capacity(DEFAULT_ROLES.len());
    for (name, rank, description) in DEFAULT_ROLES {
        let model = match roles::find_by_name(db, name).await? {
            Some(existing) => existing,
            None => {
                roles::create(
                    db,
                    NewRole {
                        name: Some((*name).to_string()),
                        rank: Some(*rank),
                        description: Some((*description).to_string()),
                    },
                )
                .await?
            }
        };
        seeded.push(model);
    }
    Ok(seeded)
}

pub async fn ensure_default_departments<C: ConnectionTrait>(
    db: &C,
) -> HrResult<Vec<department::Model>> {
    let mut seeded = Vec::with_capacity(DEFAULT_DEPARTMENTS.len());
    for (name, code) in DEFAULT_DEPARTMENTS {
        let model = match departments::find_by_name(db, name).await? {
            Some(existing) => existing,
            None => {
                departments::create(
                    db,
                    NewDepartment {
                        name: Some((*name).to_string()),
                        code: Some((*code).to_string()),
                        description: None,
                    },
                )
                .await?
            }
        };
        seeded.push(model);
    }
    Ok(seeded)
}

/// Creates the default roles, departments and an administrator account.
///
/// Re-running with the same email promotes that account back to the admin
/// role in the Administration department instead of failing.
pub async fn seed_admin<C: ConnectionTrait>(db: &C, admin: SeedAdmin) -> HrResult<UserView> {
    let roles = ensure_default_roles(db).await?;
    let departments = ensure_default_departments(db).await?;
    let admin_role = roles
        .iter()
        .find(|model| model.name == ADMIN_ROLE)
        .ok_or(HrError::NotFound("Role"))?;
    let admin_department = departments
        .first()
        .ok_or(HrError::NotFound("Department"))?;

    match users::find_by_login(db, &admin.email).await? {
        Some(existing) => {
            let mut active: user::ActiveModel = existing.into();
            active.role_id = Set(Some(admin_role.id));
            active.department_id = Set(Some(admin_department.id));
            active.status = Set(user::Status::Active);
            let updated = active.update(db).await?;
            tracing::info!(user_id = %updated.id, "existing account promoted to admin");
            users::get(db, updated.id, users::Visibility::Everyone).await
        }
        None => {
            users::create(
                db,
                NewUser {
                    name: Some(admin.name),
                    username: None,
                    email: Some(admin.email),
                    password: Some(admin.password),
                    role_id: Some(admin_role.id),
                    department_id: Some(admin_department.id),
                    avatar_url: None,
                },
            )
            .await
        }
    }
}
