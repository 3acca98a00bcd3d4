use std::collections::HashMap;

use chrono::Utc;
use entity::{department, role, user};
use platform_authz::{AccessGrant, Scope};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, prelude::DateTimeWithTimeZone,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{HrError, HrResult, passwords, roles::clean_optional};

const MAX_NAME_LEN: usize = 100;
const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 150;

/// Row filter derived from an access grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Own(Uuid),
    Department(Uuid),
    Everyone,
}

impl Visibility {
    pub fn for_grant(grant: &AccessGrant) -> Self {
        let caller = &grant.principal;
        match grant.scope {
            Scope::Own => Visibility::Own(caller.id),
            Scope::Department => caller
                .department_id()
                .map_or(Visibility::Own(caller.id), Visibility::Department),
            Scope::All => Visibility::Everyone,
        }
    }

    fn condition(self) -> Condition {
        match self {
            Visibility::Own(id) => Condition::all().add(user::Column::Id.eq(id)),
            Visibility::Department(id) => Condition::all().add(user::Column::DepartmentId.eq(id)),
            Visibility::Everyone => Condition::all(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub rank: i32,
}

impl From<role::Model> for RoleSummary {
    fn from(model: role::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            rank: model.rank,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentSummary {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

impl From<department::Model> for DepartmentSummary {
    fn from(model: department::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
        }
    }
}

/// Public shape of a user; carries no password material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub email: String,
    pub role_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub status: user::Status,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub avatar_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub role: Option<RoleSummary>,
    pub department: Option<DepartmentSummary>,
}

impl UserView {
    fn from_parts(
        model: user::Model,
        role: Option<RoleSummary>,
        department: Option<DepartmentSummary>,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            username: model.username,
            email: model.email,
            role_id: model.role_id,
            department_id: model.department_id,
            status: model.status,
            last_login_at: model.last_login_at,
            avatar_url: model.avatar_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
            role,
            department,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    /// `Some(None)` (an explicit JSON `null`) clears the column.
    #[serde(default, deserialize_with = "nullable")]
    pub username: Option<Option<String>>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub role_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department_id: Option<Option<Uuid>>,
    pub status: Option<user::Status>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar_url: Option<Option<String>>,
}

/// Keeps "absent" (`None`) apart from "null" (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Ordered by name.
pub async fn list<C: ConnectionTrait>(db: &C, visibility: Visibility) -> HrResult<Vec<UserView>> {
    let records = user::Entity::find()
        .filter(visibility.condition())
        .order_by_asc(user::Column::Name)
        .order_by_asc(user::Column::Email)
        .all(db)
        .await?;
    attach_relations(db, records).await
}

/// Rows outside `visibility` are reported as missing.
pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid, visibility: Visibility) -> HrResult<UserView> {
    let model = find_visible(db, id, visibility).await?;
    view(db, model).await
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewUser) -> HrResult<UserView> {
    let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password)
    else {
        return Err(HrError::validation("Name, email and password are required."));
    };
    let name = validate_name(&name)?;
    let email = normalize_email(&email)?;
    let username = input.username.as_deref().map(validate_username).transpose()?;
    let password_hash = passwords::hash_password(&password)?;

    ensure_email_free(db, &email, None).await?;
    if let Some(username) = &username {
        ensure_username_free(db, username, None).await?;
    }
    if let Some(role_id) = input.role_id {
        ensure_role_exists(db, role_id).await?;
    }
    if let Some(department_id) = input.department_id {
        ensure_department_exists(db, department_id).await?;
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        role_id: Set(input.role_id),
        department_id: Set(input.department_id),
        status: Set(user::Status::Active),
        last_login_at: Set(None),
        avatar_url: Set(clean_optional(input.avatar_url)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    tracing::info!(user_id = %model.id, "user created");
    view(db, model).await
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    visibility: Visibility,
    patch: UserPatch,
) -> HrResult<UserView> {
    let current = find_visible(db, id, visibility).await?;
    let mut active: user::ActiveModel = current.clone().into();

    if let Some(name) = &patch.name {
        active.name = Set(validate_name(name)?);
    }
    match &patch.username {
        Some(Some(username)) => {
            let username = validate_username(username)?;
            if current.username.as_deref() != Some(username.as_str()) {
                ensure_username_free(db, &username, Some(id)).await?;
            }
            active.username = Set(Some(username));
        }
        Some(None) => active.username = Set(None),
        None => {}
    }
    if let Some(email) = &patch.email {
        let email = normalize_email(email)?;
        if current.email != email {
            ensure_email_free(db, &email, Some(id)).await?;
        }
        active.email = Set(email);
    }
    if let Some(password) = &patch.password {
        active.password_hash = Set(passwords::hash_password(password)?);
    }
    if let Some(role_id) = patch.role_id {
        if let Some(role_id) = role_id {
            ensure_role_exists(db, role_id).await?;
        }
        active.role_id = Set(role_id);
    }
    if let Some(department_id) = patch.department_id {
        if let Some(department_id) = department_id {
            ensure_department_exists(db, department_id).await?;
        }
        active.department_id = Set(department_id);
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(avatar_url) = patch.avatar_url {
        active.avatar_url = Set(clean_optional(avatar_url));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(db).await?;
    tracing::info!(user_id = %updated.id, "user updated");
    view(db, updated).await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid, visibility: Visibility) -> HrResult<()> {
    let model = find_visible(db, id, visibility).await?;
    user::Entity::delete_by_id(model.id).exec(db).await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(())
}

/// Looks a user up by email (case-insensitive) or username.
pub async fn find_by_login<C: ConnectionTrait>(db: &C, login: &str) -> HrResult<Option<user::Model>> {
    let trimmed = login.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(trimmed.to_lowercase()))
                .add(user::Column::Username.eq(trimmed)),
        )
        .one(db)
        .await?)
}

pub(crate) async fn touch_last_login<C: ConnectionTrait>(db: &C, model: user::Model) -> HrResult<user::Model> {
    let mut active: user::ActiveModel = model.into();
    active.last_login_at = Set(Some(Utc::now().into()));
    Ok(active.update(db).await?)
}

async fn find_visible<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    visibility: Visibility,
) -> HrResult<user::Model> {
    user::Entity::find_by_id(id)
        .filter(visibility.condition())
        .one(db)
        .await?
        .ok_or(HrError::NotFound("User"))
}

async fn view<C: ConnectionTrait>(db: &C, model: user::Model) -> HrResult<UserView> {
    let role = match model.role_id {
        Some(id) => role::Entity::find_by_id(id).one(db).await?.map(RoleSummary::from),
        None => None,
    };
    let department = match model.department_id {
        Some(id) => department::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(DepartmentSummary::from),
        None => None,
    };
    Ok(UserView::from_parts(model, role, department))
}

async fn attach_relations<C: ConnectionTrait>(
    db: &C,
    records: Vec<user::Model>,
) -> HrResult<Vec<UserView>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let role_ids: Vec<Uuid> = records.iter().filter_map(|u| u.role_id).collect();
    let department_ids: Vec<Uuid> = records.iter().filter_map(|u| u.department_id).collect();

    let roles: HashMap<Uuid, RoleSummary> = if role_ids.is_empty() {
        HashMap::new()
    } else {
        role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, RoleSummary::from(model)))
            .collect()
    };
    let departments: HashMap<Uuid, DepartmentSummary> = if department_ids.is_empty() {
        HashMap::new()
    } else {
        department::Entity::find()
            .filter(department::Column::Id.is_in(department_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, DepartmentSummary::from(model)))
            .collect()
    };

    Ok(records
        .into_iter()
        .map(|model| {
            let role = model.role_id.and_then(|id| roles.get(&id).cloned());
            let department = model
                .department_id
                .and_then(|id| departments.get(&id).cloned());
            UserView::from_parts(model, role, department)
        })
        .collect())
}

async fn ensure_email_free<C: ConnectionTrait>(db: &C, email: &str, except: Option<Uuid>) -> HrResult<()> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(HrError::conflict("Email already in use"));
    }
    Ok(())
}

async fn ensure_username_free<C: ConnectionTrait>(
    db: &C,
    username: &str,
    except: Option<Uuid>,
) -> HrResult<()> {
    let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(HrError::conflict("Username already in use"));
    }
    Ok(())
}

async fn ensure_role_exists<C: ConnectionTrait>(db: &C, id: Uuid) -> HrResult<()> {
    if role::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(HrError::validation(format!("Unknown role {id}")));
    }
    Ok(())
}

async fn ensure_department_exists<C: ConnectionTrait>(db: &C, id: Uuid) -> HrResult<()> {
    if department::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(HrError::validation(format!("Unknown department {id}")));
    }
    Ok(())
}

fn validate_name(value: &str) -> HrResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HrError::validation("name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(HrError::validation(format!(
            "name must be <= {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_username(value: &str) -> HrResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(HrError::validation("username must be a single non-empty word"));
    }
    // Logins match email or username, so a username must never look like an email.
    if trimmed.contains('@') {
        return Err(HrError::validation("username must not contain '@'"));
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(HrError::validation(format!(
            "username must be <= {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(value: &str) -> HrResult<String> {
    let normalized = value.trim().to_lowercase();
    let valid_shape = normalized
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_shape {
        return Err(HrError::validation("Invalid email address"));
    }
    if normalized.chars().count() > MAX_EMAIL_LEN {
        return Err(HrError::validation(format!(
            "email must be <= {MAX_EMAIL_LEN} characters"
        )));
    }
    Ok(normalized)
}
