use axum::{
    Extension, Json,
    extract::{Path, State},
};
use platform_api::{ApiResult, Created, Envelope};
use platform_authz::AccessGrant;
use products_hr::{
    Visibility,
    users::{self, NewUser, UserPatch, UserView},
};
use uuid::Uuid;

use super::{AppState, hr_error};

pub async fn list(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
) -> ApiResult<Envelope<Vec<UserView>>> {
    let users = users::list(&state.pool, Visibility::for_grant(&grant))
        .await
        .map_err(hr_error)?;
    Ok(Envelope::data(users))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
) -> ApiResult<Envelope<UserView>> {
    let user = users::get(&state.pool, grant.principal.id, Visibility::Own(grant.principal.id))
        .await
        .map_err(hr_error)?;
    Ok(Envelope::data(user))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<UserView>> {
    let user = users::get(&state.pool, id, Visibility::for_grant(&grant))
        .await
        .map_err(hr_error)?;
    Ok(Envelope::data(user))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
    Json(input): Json<NewUser>,
) -> ApiResult<Created<UserView>> {
    let user = users::create(&state.pool, input).await.map_err(hr_error)?;
    tracing::info!(created_by = %grant.principal.id, user_id = %user.id, "user account created");
    Ok(Created(Envelope::with_message("User created successfully", user)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Envelope<UserView>> {
    let user = users::update(&state.pool, id, Visibility::for_grant(&grant), patch)
        .await
        .map_err(hr_error)?;
    Ok(Envelope::with_message("User updated successfully", user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(grant): Extension<AccessGrant>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<()>> {
    users::delete(&state.pool, id, Visibility::for_grant(&grant))
        .await
        .map_err(hr_error)?;
    Ok(Envelope::message("User deleted successfully"))
}
