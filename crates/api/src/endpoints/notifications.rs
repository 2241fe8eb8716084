//! Notification endpoints.

use axum::{
    Json, Router,
    extract::{Query, Request, State},
    middleware::{self, Next},
    routing::{get, post},
};
use classreg_common::AppResult;
use classreg_core::RecipientsInput;
use classreg_db::entities::notification;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{AppState, check_permissions},
    response::ApiResponse,
};

/// Code required to resolve notification recipients.
const RECIPIENTS_PERMISSIONS: &[&str] = &["GET_NOTIFICATION_RECIPIENTS"];

/// Recipients response.
#[derive(Serialize)]
pub struct RecipientsResponse {
    pub recipients: Vec<String>,
}

/// Resolve who can receive a notification.
async fn recipients(
    State(state): State<AppState>,
    AuthUser(sender): AuthUser,
    Json(input): Json<RecipientsInput>,
) -> AppResult<Json<RecipientsResponse>> {
    let recipients = state
        .notification_service
        .recipients(&sender, input)
        .await?;
    Ok(Json(RecipientsResponse { recipients }))
}

/// Sent-notification list query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Notification audit record response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub emails: String,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            title: n.title,
            content: n.content,
            emails: n.emails,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Notifications the caller has sent, newest first.
async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let sent = state
        .notification_service
        .sent_by(&user.email, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(
        sent.into_iter().map(NotificationResponse::from).collect(),
    ))
}

/// Create the notifications router.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route(
            "/recipients",
            post(recipients).layer(middleware::from_fn_with_state(
                state,
                |State(state): State<AppState>, req: Request, next: Next| async move {
                    check_permissions(state, RECIPIENTS_PERMISSIONS, req, next).await
                },
            )),
        )
}
