use axum::Router;
use axum::routing::get;

use super::AppState;

mod delete;
mod error;
mod files;
mod list;
mod upload;

pub use error::ApiError;

/// Mounted under `/datasets`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::handler).post(upload::handler))
        .route("/:key", get(files::list_handler).delete(delete::handler))
        .route("/:key/*path", get(files::read_handler))
}
