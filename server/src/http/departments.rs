use axum::{
    Json,
    extract::{Path, State},
};
use entity::department;
use platform_api::{ApiResult, Created, Envelope};
use products_hr::departments::{self, NewDepartment};
use uuid::Uuid;

use super::{AppState, hr_error};

pub async fn list(
    State(state): State<AppState>,
) -> ApiResult<Envelope<Vec<department::Model>>> {
    let departments = departments::list(&state.pool).await.map_err(hr_error)?;
    Ok(Envelope::data(departments))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Envelope<department::Model>> {
    let department = departments::get(&state.pool, id).await.map_err(hr_error)?;
    Ok(Envelope::data(department))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewDepartment>,
) -> ApiResult<Created<department::Model>> {
    let department = departments::create(&state.pool, input)
        .await
        .map_err(hr_error)?;
    Ok(Created(Envelope::with_message(
        "Department created successfully",
        department,
    )))
}
