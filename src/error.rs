use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::repo::StoreError;

/// Infrastructure faults that escape the auth flows. Everything the user can cause
/// (bad forms, bad credentials, bad links) is handled inside the controller instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("session store: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("user store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
            .into_response()
    }
}
