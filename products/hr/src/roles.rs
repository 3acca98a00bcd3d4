use entity::role;
use platform_authz::MIN_RANK;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{HrError, HrResult};

pub const MAX_RANK: i32 = 100;
const MAX_NAME_LEN: usize = 32;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewRole {
    pub name: Option<String>,
    pub rank: Option<i32>,
    pub description: Option<String>,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewRole) -> HrResult<role::Model> {
    let (Some(name), Some(rank)) = (input.name, input.rank) else {
        return Err(HrError::validation("Name and rank are required."));
    };
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(HrError::validation("Name and rank are required."));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HrError::validation(format!(
            "name must be <= {MAX_NAME_LEN} characters"
        )));
    }
    if !(MIN_RANK..=MAX_RANK).contains(&rank) {
        return Err(HrError::validation(format!(
            "rank must be between {MIN_RANK} and {MAX_RANK}"
        )));
    }
    if find_by_name(db, &name).await?.is_some() {
        return Err(HrError::conflict(format!("Role {name} already exists")));
    }

    let model = role::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        rank: Set(rank),
        description: Set(clean_optional(input.description)),
    }
    .insert(db)
    .await?;
    tracing::info!(role_id = %model.id, role = %model.name, rank = model.rank, "role created");
    Ok(model)
}

/// Highest rank first.
pub async fn list<C: ConnectionTrait>(db: &C) -> HrResult<Vec<role::Model>> {
    Ok(role::Entity::find()
        .order_by_desc(role::Column::Rank)
        .order_by_asc(role::Column::Name)
        .all(db)
        .await?)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid) -> HrResult<role::Model> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(HrError::NotFound("Role"))
}

pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> HrResult<Option<role::Model>> {
    Ok(role::Entity::find()
        .filter(role::Column::Name.eq(name.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
