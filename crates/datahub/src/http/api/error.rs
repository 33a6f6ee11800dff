use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use datahub_store::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] datahub_store::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err.kind() {
                ErrorKind::MissingField | ErrorKind::Decode | ErrorKind::PathEscape => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Format => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Io | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({"error": self.to_string()});
        (status, Json(body)).into_response()
    }
}

/// Run a blocking store call off the async workers.
pub(super) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> datahub_store::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}
