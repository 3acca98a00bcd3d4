use axum::{
    Json,
    extract::{Path, State},
};
use entity::role;
use platform_api::{ApiResult, Created, Envelope};
use products_hr::roles::{self, NewRole};
use uuid::Uuid;

use super::{AppState, hr_error};

pub async fn list(State(state): State<AppState>) -> ApiResult<Envelope<Vec<role::Model>>> {
    let roles = roles::list(&state.pool).await.map_err(hr_error)?;
    Ok(Envelope::data(roles))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<role::Model>> {
    let role = roles::get(&state.pool, id).await.map_err(hr_error)?;
    Ok(Envelope::data(role))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewRole>,
) -> ApiResult<Created<role::Model>> {
    let role = roles::create(&state.pool, input).await.map_err(hr_error)?;
    Ok(Created(Envelope::with_message("Role created successfully", role)))
}
