//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use smartstock_core::domain::{AccessToken, User};
use smartstock_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: AccessToken,
}

/// Middleware that validates the bearer token against the backend.
///
/// If valid, inserts a [`CurrentUser`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Resolve the user it belongs to
    let user = state.auth.current_user(&token).await.map_err(|e| match e {
        PortError::Unauthorized | PortError::Forbidden(_) | PortError::NotFound(_) => {
            StatusCode::UNAUTHORIZED
        }
        PortError::Unexpected(msg) => {
            error!("Failed to validate token: {}", msg);
            StatusCode::BAD_GATEWAY
        }
    })?;

    // 3. Hand it to the handler
    req.extensions_mut().insert(CurrentUser { user, token });
    Ok(next.run(req).await)
}

/// Rejects non-admin users with 403. Must run inside [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, StatusCode> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !current.user.is_admin() {
        warn!(user_id = %current.user.user_id, "Non-admin tried to reach an admin route");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(req).await)
}
