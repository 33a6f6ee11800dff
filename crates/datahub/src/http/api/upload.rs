use axum::Json;
use axum::extract::State;
use datahub_store::{UploadPayload, UploadReport};

use super::error::{ApiError, blocking};
use crate::http::AppState;

pub async fn handler(
    State(state): State<AppState>,
    Json(payload): Json<UploadPayload>,
) -> Result<Json<UploadReport>, ApiError> {
    let store = state.store().clone();
    let report = blocking(move || store.upload(&payload)).await?;
    Ok(Json(report))
}
