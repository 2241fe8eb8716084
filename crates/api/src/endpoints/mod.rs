//! API endpoints.

mod admin;
mod auth;
mod health;
mod notifications;
mod students;
mod teachers;
mod users;

use axum::{Router, middleware};

use crate::middleware::{AppState, auth_middleware};

/// Create the API router.
///
/// Permission-gated routes need the state at layer-construction time, so the
/// full router takes it here and the server mounts the result as-is.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/teachers", teachers::router(state.clone()))
        .nest("/students", students::router(state.clone()))
        .nest("/notifications", notifications::router(state.clone()))
        .nest("/admin", admin::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(health::router())
        .with_state(state)
}
