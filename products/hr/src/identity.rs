//! Turns stored accounts into authorization principals.

use entity::{department, role, user};
use platform_authz::{DepartmentRef, Principal, RoleRef};
use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{HrResult, passwords, users};

/// Result of checking a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(user::Model),
    InvalidCredentials,
    Disabled,
}

/// Builds the principal for `user_id`.
///
/// Missing or non-active accounts yield `None`. A dangling role or department
/// reference leaves that half of the principal empty, which the resolver
/// treats as unauthenticated.
pub async fn load_principal<C: ConnectionTrait>(db: &C, user_id: Uuid) -> HrResult<Option<Principal>> {
    let Some(account) = user::Entity::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };
    if account.status != user::Status::Active {
        return Ok(None);
    }
    Ok(Some(principal_for(db, &account).await?))
}

pub async fn principal_for<C: ConnectionTrait>(db: &C, account: &user::Model) -> HrResult<Principal> {
    let role = match account.role_id {
        Some(id) => role::Entity::find_by_id(id).one(db).await?.map(|model| RoleRef {
            id: model.id,
            name: model.name,
            rank: model.rank,
        }),
        None => None,
    };
    let department = match account.department_id {
        Some(id) => department::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|model| DepartmentRef {
                id: model.id,
                name: model.name,
                code: model.code,
            }),
        None => None,
    };
    Ok(Principal {
        id: account.id,
        role,
        department,
    })
}

/// Verifies `password` for the account named by `login` (email or username).
///
/// Unknown logins and wrong passwords are indistinguishable to the caller,
/// in outcome and in the argon2 work spent.
/// A successful attempt stamps `last_login_at`.
pub async fn verify_login<C: ConnectionTrait>(
    db: &C,
    login: &str,
    password: &str,
) -> HrResult<LoginOutcome> {
    let Some(account) = users::find_by_login(db, login).await? else {
        passwords::verify_dummy(password);
        return Ok(LoginOutcome::InvalidCredentials);
    };
    if !passwords::verify_password(password, &account.password_hash)? {
        tracing::debug!(user_id = %account.id, "password mismatch");
        return Ok(LoginOutcome::InvalidCredentials);
    }
    if account.status != user::Status::Active {
        return Ok(LoginOutcome::Disabled);
    }
    let account = users::touch_last_login(db, account).await?;
    Ok(LoginOutcome::Authenticated(account))
}
