use crate::state::AppState;
use axum::Router;

mod claims;
pub mod controller;
mod dto;
pub mod forms;
mod guard;
pub mod handlers;
pub mod password;
mod redirect;
pub mod repo;
pub mod repo_types;
pub mod session;
pub mod tokens;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::anonymous_routes())
        .merge(handlers::session_routes())
}
