use axum::{Json, extract::State};
use platform_api::{ApiError, ApiResult, Envelope};
use products_hr::{
    Visibility,
    identity::{self, LoginOutcome},
    users::{self, UserView},
};
use serde::{Deserialize, Serialize};

use super::{AppState, hr_error};
use crate::auth;

#[derive(Deserialize)]
pub struct LoginRequest {
    login: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    token: String,
    token_type: &'static str,
    expires_in: i64,
    user: UserView,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Envelope<LoginResponse>> {
    let outcome = identity::verify_login(&state.pool, &request.login, &request.password)
        .await
        .map_err(hr_error)?;
    let account = match outcome {
        LoginOutcome::Authenticated(account) => account,
        LoginOutcome::InvalidCredentials => {
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        LoginOutcome::Disabled => return Err(ApiError::forbidden("Account disabled")),
    };

    let auth_config = &state.config.auth;
    let token = auth::issue_token(account.id, auth_config)
        .map_err(|err| ApiError::internal(err.into()))?;
    let user = users::get(&state.pool, account.id, Visibility::Own(account.id))
        .await
        .map_err(hr_error)?;
    tracing::info!(user_id = %account.id, "login succeeded");

    Ok(Envelope::with_message(
        "Login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: auth_config.token_ttl_minutes * 60,
            user,
        },
    ))
}
