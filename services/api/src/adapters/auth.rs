//! services/api/src/adapters/auth.rs
//!
//! This module contains the adapter for the backend's account endpoints.
//! It implements the `AuthService` port from the `core` crate.

use super::backend::{parse_timestamp, BackendClient};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use smartstock_core::domain::{AccessToken, AuthGrant, NewUser, User, UserRole};
use smartstock_core::ports::{AuthService, PortResult};
use tracing::info;

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct UserRecord {
    user_id: String,
    email: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    created_at: String,
}

impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            created_at: parse_timestamp(&self.created_at)?,
            role: self
                .role
                .as_deref()
                .map(UserRole::from_name)
                .unwrap_or(UserRole::User),
            user_id: self.user_id,
            email: self.email,
            full_name: self.full_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct RegisterRecord<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenRecord {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    user: UserRecord,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AuthService` port against `/auth/*`.
#[derive(Clone)]
pub struct HttpAuthAdapter {
    backend: BackendClient,
}

impl HttpAuthAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpAuthAdapter {
    async fn register(&self, new_user: &NewUser) -> PortResult<User> {
        let body = RegisterRecord {
            email: &new_user.email,
            password: &new_user.password,
            full_name: new_user.full_name.as_deref(),
        };
        let request = self.backend.request(Method::POST, &["auth", "register"])?.json(&body);
        let user = BackendClient::send_json::<UserRecord>(request).await?.to_domain()?;
        info!(user_id = %user.user_id, "Registered new account");
        Ok(user)
    }

    /// The backend uses the OAuth2 password form, where the email goes in `username`.
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthGrant> {
        let request = self
            .backend
            .request(Method::POST, &["auth", "login"])?
            .form(&[("username", email), ("password", password)]);
        let record = BackendClient::send_json::<TokenRecord>(request).await?;
        Ok(AuthGrant {
            access_token: AccessToken::new(record.access_token),
            token_type: record.token_type,
            user: record.user.to_domain()?,
        })
    }

    async fn current_user(&self, token: &AccessToken) -> PortResult<User> {
        let request = self.backend.authed(Method::GET, &["auth", "me"], token)?;
        BackendClient::send_json::<UserRecord>(request).await?.to_domain()
    }
}
