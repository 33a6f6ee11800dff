use axum::Json;
use axum::extract::State;
use datahub_store::StorageKey;

use super::error::{ApiError, blocking};
use crate::http::AppState;

pub async fn handler(State(state): State<AppState>) -> Result<Json<Vec<StorageKey>>, ApiError> {
    let store = state.store().clone();
    let keys = blocking(move || store.list()).await?;
    Ok(Json(keys))
}
