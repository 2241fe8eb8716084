//! Teacher endpoints.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    routing::post,
};
use classreg_common::AppResult;
use classreg_core::TeacherRegisterInput;

use crate::{
    extractors::AuthUser,
    middleware::{AppState, check_permissions},
};

/// Code required to register students with a teacher.
const REGISTER_PERMISSIONS: &[&str] = &["REGISTER_STUDENT_TO_TEACHER"];

/// Register a batch of students with a teacher.
async fn register(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<TeacherRegisterInput>,
) -> AppResult<StatusCode> {
    state
        .user_service
        .teacher_register(&actor.email, input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the teachers router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new().route(
        "/register",
        post(register).layer(middleware::from_fn_with_state(
            state,
            |State(state): State<AppState>, req: Request, next: Next| async move {
                check_permissions(state, REGISTER_PERMISSIONS, req, next).await
            },
        )),
    )
}
