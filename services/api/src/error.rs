//! services/api/src/error.rs
//!
//! Defines the primary error type for the gateway service, and the mapping
//! from core errors to HTTP responses used by the handlers.

use crate::adapters::BackendSetupError;
use crate::config::ConfigError;
use axum::http::StatusCode;
use smartstock_core::{CheckoutError, PortError, WizardError};

/// The primary error type for the `smartstock_api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error setting up the backend HTTP client.
    #[error("Backend client error: {0}")]
    Backend(#[from] BackendSetupError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The error half of every handler's return type.
pub type HandlerError = (StatusCode, String);

pub fn port_rejection(e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        PortError::Unexpected(msg) => (StatusCode::BAD_GATEWAY, msg),
    }
}

pub fn wizard_rejection(e: WizardError) -> HandlerError {
    match e {
        WizardError::UnsupportedMediaType(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string()),
        WizardError::MissingImage | WizardError::Validation(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        WizardError::InvalidTransition { .. } => (StatusCode::CONFLICT, e.to_string()),
        WizardError::Classification(PortError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        }
        WizardError::Classification(_) => (StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

pub fn checkout_rejection(e: CheckoutError) -> HandlerError {
    let message = e.to_string();
    match e {
        CheckoutError::MissingDraft => (StatusCode::NOT_FOUND, message),
        CheckoutError::AlreadySaving => (StatusCode::CONFLICT, message),
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, message),
        CheckoutError::Persistence(port) => (port_rejection(port).0, message),
    }
}
