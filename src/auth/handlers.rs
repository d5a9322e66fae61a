use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;

use super::{
    controller::{AuthController, AuthOutcome, Page, View, INDEX},
    dto::{IndexBody, PageBody, PublicUser},
    forms::{LoginForm, NextParam, RegisterForm, ResetPasswordForm, ResetRequestForm},
    guard::anonymous_only,
    session::AuthSession,
};
use crate::{error::AppError, state::AppState};

/// Routes that must not be reachable with a logged-in session.
pub fn anonymous_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/reset_password", get(reset_request_page).post(reset_request))
        .route("/reset_password/:token", get(reset_password_page).post(reset_password))
        .route_layer(middleware::from_fn_with_state(INDEX, anonymous_only))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/logout", get(logout))
}

/// Turns a controller outcome into a response; rendered pages drain pending flashes.
async fn respond(outcome: AuthOutcome, session: &AuthSession) -> Result<Response, AppError> {
    match outcome {
        AuthOutcome::Redirect(to) => Ok(Redirect::to(&to).into_response()),
        AuthOutcome::Render(page) => {
            let status = if page.errors.is_empty() {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let flashes = session.take_flashes().await?;
            Ok((status, Json(PageBody::new(page, flashes))).into_response())
        }
    }
}

async fn render(view: View, session: &AuthSession) -> Result<Response, AppError> {
    respond(AuthOutcome::Render(Page::new(view)), session).await
}

#[instrument(skip_all)]
pub async fn index(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
) -> Result<Json<IndexBody>, AppError> {
    let user = auth.current_user(&session).await?.map(PublicUser::from);
    let flashes = session.take_flashes().await?;
    Ok(Json(IndexBody { user, flashes }))
}

#[instrument(skip_all)]
pub async fn register_page(session: AuthSession) -> Result<Response, AppError> {
    render(View::Register, &session).await
}

#[instrument(skip(auth, session, form))]
pub async fn register(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let outcome = auth.register(&session, form).await?;
    respond(outcome, &session).await
}

#[instrument(skip_all)]
pub async fn login_page(session: AuthSession) -> Result<Response, AppError> {
    render(View::Login, &session).await
}

#[instrument(skip(auth, session, form))]
pub async fn login(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
    Query(params): Query<NextParam>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let outcome = auth.login(&session, form, params.next.as_deref()).await?;
    respond(outcome, &session).await
}

#[instrument(skip_all)]
pub async fn logout(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
) -> Result<Response, AppError> {
    let outcome = auth.logout(&session).await?;
    respond(outcome, &session).await
}

#[instrument(skip_all)]
pub async fn reset_request_page(session: AuthSession) -> Result<Response, AppError> {
    render(View::ResetRequest, &session).await
}

#[instrument(skip(auth, session, form))]
pub async fn reset_request(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
    Form(form): Form<ResetRequestForm>,
) -> Result<Response, AppError> {
    let outcome = auth.request_password_reset(&session, form).await?;
    respond(outcome, &session).await
}

#[instrument(skip_all)]
pub async fn reset_password_page(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let outcome = auth.reset_password_page(&session, &token).await?;
    respond(outcome, &session).await
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(auth): State<Arc<AuthController>>,
    session: AuthSession,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let outcome = auth.reset_password(&session, &token, form).await?;
    respond(outcome, &session).await
}
