//! Admin endpoints. Every route here sits behind the permission gate.

use axum::{
    Router,
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    routing::get,
};
use classreg_common::AppResult;
use classreg_core::ListUsersInput;

use super::users::UserResponse;
use crate::{
    extractors::AuthRoles,
    middleware::{AppState, check_permissions},
    response::{ApiResponse, no_content},
};

/// Codes accepted for the admin user routes; holding any one of them passes.
const ADMIN_USER_PERMISSIONS: &[&str] = &["admin.users", "admin.super"];

/// List users with optional name/status filters.
async fn list_users(
    State(state): State<AppState>,
    AuthRoles(roles): AuthRoles,
    Query(query): Query<ListUsersInput>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    tracing::debug!(roles = ?roles, "Admin user listing");

    let users = state.user_service.list(query).await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// Soft-delete a user and invalidate their cached roles.
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.user_service.delete_by_id(&id).await?;
    Ok(no_content())
}

/// Create the admin router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", axum::routing::delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            state,
            |State(state): State<AppState>, req: Request, next: Next| async move {
                check_permissions(state, ADMIN_USER_PERMISSIONS, req, next).await
            },
        ))
}
