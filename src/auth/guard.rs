use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::session::AuthSession;
use crate::error::AppError;

/// Route layer for pages that only make sense to anonymous visitors. An
/// authenticated session is sent to `fallback` before the handler runs.
///
/// ```ignore
/// router.route_layer(middleware::from_fn_with_state(INDEX, anonymous_only))
/// ```
pub async fn anonymous_only(
    State(fallback): State<&'static str>,
    session: AuthSession,
    request: Request,
    next: Next,
) -> Response {
    match session.is_authenticated().await {
        Ok(true) => {
            debug!(path = %request.uri().path(), "authenticated user on anonymous-only route");
            Redirect::to(fallback).into_response()
        }
        Ok(false) => next.run(request).await,
        Err(e) => AppError::from(e).into_response(),
    }
}
