use chrono::Utc;
use entity::department;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func, SimpleExpr},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{HrError, HrResult, roles::clean_optional};

const MAX_NAME_LEN: usize = 100;
const MAX_CODE_LEN: usize = 20;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewDepartment {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    input: NewDepartment,
) -> HrResult<department::Model> {
    let name = input.name.as_deref().map(str::trim).unwrap_or_default();
    let code = input.code.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() || code.is_empty() {
        return Err(HrError::validation("Name and code are required."));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HrError::validation(format!(
            "name must be <= {MAX_NAME_LEN} characters"
        )));
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(HrError::validation(format!(
            "code must be <= {MAX_CODE_LEN} characters"
        )));
    }
    if find_by_name(db, name).await?.is_some() {
        return Err(HrError::conflict("Department name already in use"));
    }
    let existing_code = department::Entity::find()
        .filter(lower_eq(department::Column::Code, code))
        .one(db)
        .await?;
    if existing_code.is_some() {
        return Err(HrError::conflict("Department code already in use"));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let model = department::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        description: Set(clean_optional(input.description)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    tracing::info!(department_id = %model.id, code = %model.code, "department created");
    Ok(model)
}

pub async fn list<C: ConnectionTrait>(db: &C) -> HrResult<Vec<department::Model>> {
    Ok(department::Entity::find()
        .order_by_asc(department::Column::Name)
        .all(db)
        .await?)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid) -> HrResult<department::Model> {
    department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(HrError::NotFound("Department"))
}

/// Case-insensitive, matching how access policies compare department names.
pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> HrResult<Option<department::Model>> {
    Ok(department::Entity::find()
        .filter(lower_eq(department::Column::Name, name.trim()))
        .one(db)
        .await?)
}

fn lower_eq(column: department::Column, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.to_lowercase())
}
