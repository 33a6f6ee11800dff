use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use super::error::{ApiError, blocking};
use crate::http::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub key: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let store = state.store().clone();
    let target = key.clone();
    blocking(move || store.delete(&target)).await?;
    Ok(Json(DeleteResponse { key }))
}
