use std::io::Read;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use datahub_store::Error;

use super::error::{ApiError, blocking};
use crate::http::AppState;

/// Relative paths of every file in a dataset.
pub async fn list_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let store = state.store().clone();
    let files = blocking(move || store.list_files(&key)).await?;
    Ok(Json(files))
}

pub async fn read_handler(
    State(state): State<AppState>,
    Path((key, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let store = state.store().clone();

    let bytes = blocking(move || {
        let relative = path.trim_start_matches('/');
        let mut file = store.read_file(&key, relative)?;
        let mut bytes = Vec::with_capacity(usize::try_from(file.len).unwrap_or(0));
        file.read_to_end(&mut bytes).map_err(|source| Error::Io {
            path: file.path.clone(),
            source,
        })?;
        Ok(bytes)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}
