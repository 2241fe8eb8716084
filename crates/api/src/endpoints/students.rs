//! Student endpoints.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    routing::{get, post},
};
use axum_extra::extract::Query;
use classreg_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::{AppState, check_permissions};

/// Code required to query the common-students intersection.
const COMMON_PERMISSIONS: &[&str] = &["GET_COMMON_STUDENTS"];

/// Code required to suspend a student.
const SUSPEND_PERMISSIONS: &[&str] = &["SUSPEND_STUDENT"];

/// Common-students query. `teachers` may repeat in the query string.
#[derive(Debug, Deserialize)]
pub struct CommonStudentsQuery {
    #[serde(default)]
    pub teachers: Vec<String>,
}

/// Common-students response.
#[derive(Serialize)]
pub struct CommonStudentsResponse {
    pub students: Vec<String>,
}

/// Students registered to every teacher in the query.
async fn common(
    State(state): State<AppState>,
    Query(query): Query<CommonStudentsQuery>,
) -> AppResult<Json<CommonStudentsResponse>> {
    if query.teachers.is_empty() {
        return Err(AppError::BadRequest(
            "At least one teacher is required".to_string(),
        ));
    }

    let students = state.user_service.common_students(&query.teachers).await?;
    Ok(Json(CommonStudentsResponse { students }))
}

/// Suspension request.
#[derive(Debug, Deserialize, Validate)]
pub struct SuspendRequest {
    #[validate(email)]
    pub email: String,
}

/// Suspend a student account.
async fn suspend(
    State(state): State<AppState>,
    Json(req): Json<SuspendRequest>,
) -> AppResult<StatusCode> {
    req.validate()?;
    state.user_service.suspend_student(&req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the students router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/common",
            get(common).layer(middleware::from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>, req: Request, next: Next| async move {
                    check_permissions(state, COMMON_PERMISSIONS, req, next).await
                },
            )),
        )
        .route(
            "/suspend",
            post(suspend).layer(middleware::from_fn_with_state(
                state,
                |State(state): State<AppState>, req: Request, next: Next| async move {
                    check_permissions(state, SUSPEND_PERMISSIONS, req, next).await
                },
            )),
        )
}
