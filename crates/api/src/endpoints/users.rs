//! User profile endpoints.

use axum::{Json, Router, extract::State, routing::get};
use classreg_common::AppResult;
use classreg_core::UpdateProfileInput;
use classreg_db::entities::user::{self, UserStatus, UserType};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: UserType,
    pub status: UserStatus,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            user_type: user.user_type,
            status: user.status,
            created_at: user.created_at.to_rfc3339(),
            last_login: user.last_login.map(|t| t.to_rfc3339()),
        }
    }
}

/// Get the caller's profile.
async fn profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_profile(&user.id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's profile.
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile).patch(update_profile))
}
