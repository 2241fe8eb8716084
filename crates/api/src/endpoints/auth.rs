//! Auth endpoints.

use axum::{Json, Router, extract::State, routing::post};
use classreg_common::{AppError, AppResult};
use classreg_core::RegisterAccountInput;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Registration response.
///
/// The bearer token is only ever returned here; afterwards it is looked up,
/// never re-issued.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterAccountInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let user = state.user_service.register_account(input).await?;

    let token = user
        .token
        .ok_or_else(|| AppError::Internal("Account created without token".to_string()))?;

    Ok(ApiResponse::ok(RegisterResponse {
        id: user.id,
        email: user.email,
        token,
    }))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new().route("/auth/register", post(register))
}
