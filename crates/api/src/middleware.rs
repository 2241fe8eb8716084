//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use classreg_common::{AppError, AppResult, RoleCache, RoleStore};
use classreg_core::{NotificationService, UserService};
use classreg_db::entities::user;

use crate::extractors::AuthRoles;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub notification_service: NotificationService,
    pub role_cache: RoleCache,
}

/// Authentication middleware.
///
/// Resolves the bearer token to a user model and stashes it in request
/// extensions. Routes that need a caller use the `AuthUser` extractor, which
/// rejects with 401 when nothing was stashed.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

/// Permission gate shared by the gated route layers.
///
/// The caller passes when the role cache holds at least one of the required
/// codes for them. A cache miss yields no codes, so an unpopulated cache
/// denies rather than allows. The codes that passed are attached to the
/// request as `AuthRoles`.
pub async fn check_permissions(
    state: AppState,
    required: &'static [&'static str],
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let user = req
        .extensions()
        .get::<user::Model>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let roles = state.role_cache.get_roles(&user.id).await?;

    if !has_any_permission(&roles, required) {
        return Err(AppError::Forbidden(format!(
            "Missing required permission: {}",
            required.join(" | ")
        )));
    }

    req.extensions_mut().insert(AuthRoles(roles));
    Ok(next.run(req).await)
}

/// Any-of semantics over the caller's cached role codes.
fn has_any_permission(roles: &[String], required: &[&str]) -> bool {
    roles.iter().any(|r| required.contains(&r.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(codes: &[&str]) -> Vec<String> {
        codes.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn empty_roles_deny_everything() {
        // A cache miss produces an empty role list; it must never pass.
        assert!(!has_any_permission(&[], &["admin.users.read"]));
        assert!(!has_any_permission(&roles(&[]), &["a", "b", "c"]));
    }

    #[test]
    fn one_matching_code_is_enough() {
        let cached = roles(&["teacher.basic", "admin.users.read"]);
        assert!(has_any_permission(
            &cached,
            &["admin.users.write", "admin.users.read"]
        ));
    }

    #[test]
    fn unrelated_codes_do_not_pass() {
        let cached = roles(&["teacher.basic"]);
        assert!(!has_any_permission(&cached, &["admin.users.read"]));
    }
}
