//! services/api/src/web/auth.rs
//!
//! Account endpoints. Credentials are forwarded to the backend, which issues
//! the bearer tokens the rest of the API expects.

use crate::error::{port_rejection, HandlerError};
use crate::web::{
    middleware::CurrentUser,
    protocol::{LoginRequest, LoginResponse, RegisterRequest, UserView},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use smartstock_core::domain::NewUser;
use smartstock_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, info};

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserView),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Backend unavailable")
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Email and password are required".to_string(),
        ));
    }

    let new_user = NewUser {
        email: email.to_string(),
        password: req.password,
        full_name: req.full_name.filter(|n| !n.trim().is_empty()),
    };
    let user = state.auth.register(&new_user).await.map_err(|e| {
        error!("Failed to register user: {}", e);
        port_rejection(e)
    })?;

    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// POST /auth/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HandlerError> {
    let grant = state
        .auth
        .login(req.email.trim(), &req.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::NotFound(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            other => port_rejection(other),
        })?;

    info!(user_id = %grant.user.user_id, "User logged in");
    Ok(Json(LoginResponse {
        access_token: grant.access_token.as_str().to_string(),
        token_type: grant.token_type,
        user: grant.user.into(),
    }))
}

/// GET /auth/me - The authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserView),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me_handler(Extension(current): Extension<CurrentUser>) -> Json<UserView> {
    Json(current.user.into())
}
