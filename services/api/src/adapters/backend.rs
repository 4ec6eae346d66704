//! services/api/src/adapters/backend.rs
//!
//! The shared HTTP client for the SmartStock backend. Every port adapter in
//! this module wraps a clone of [`BackendClient`] and uses its helpers to
//! build URLs, attach bearer tokens and map failures onto `PortError`.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{multipart::Part, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use smartstock_core::domain::{AccessToken, ImageUpload};
use smartstock_core::ports::{PortError, PortResult};
use std::time::Duration;
use tracing::debug;

/// HTTP client for one SmartStock backend instance.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Creates a client with its own connection pool.
    ///
    /// * `base_url` - e.g. `http://localhost:8000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendSetupError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, BackendSetupError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendSetupError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendSetupError::InvalidUrl(
                base_url.to_string(),
                "cannot be used as a base URL".to_string(),
            ));
        }
        Ok(Self { client, base_url })
    }

    /// Joins percent-encoded path segments onto the base URL.
    ///
    /// An empty trailing segment produces a trailing slash, which the backend's
    /// collection routes expect.
    pub fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn request(&self, method: Method, segments: &[&str]) -> PortResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Backend request");
        Ok(self.client.request(method, url))
    }

    pub fn authed(
        &self,
        method: Method,
        segments: &[&str],
        token: &AccessToken,
    ) -> PortResult<RequestBuilder> {
        Ok(self.request(method, segments)?.bearer_auth(token.as_str()))
    }

    // ---- response helpers ----

    /// Sends the request and parses a successful JSON body.
    pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> PortResult<T> {
        let response = Self::send(request).await?;
        response.json::<T>().await.map_err(|e| {
            PortError::Unexpected(format!("Malformed backend response: {}", e))
        })
    }

    /// Sends the request, discarding the body.
    pub async fn send_empty(request: RequestBuilder) -> PortResult<()> {
        Self::send(request).await?;
        Ok(())
    }

    pub async fn send_bytes(request: RequestBuilder) -> PortResult<Bytes> {
        let response = Self::send(request).await?;
        response.bytes().await.map_err(transport_error)
    }

    async fn send(request: RequestBuilder) -> PortResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        Self::ensure_success(response).await
    }

    /// Maps non-2xx statuses: 401 to `Unauthorized`, 403 to `Forbidden`, 404 to `NotFound`,
    /// anything else to `Unexpected` with the status and body.
    async fn ensure_success(response: Response) -> PortResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(status_error(status, &url, body))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendSetupError {
    #[error("Invalid backend URL '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub fn status_error(status: StatusCode, path: &str, body: String) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED => PortError::Unauthorized,
        StatusCode::FORBIDDEN => PortError::Forbidden(detail(&body)),
        StatusCode::NOT_FOUND => PortError::NotFound(format!("{} ({})", path, detail(&body))),
        _ => PortError::Unexpected(format!(
            "Backend error ({}) on {}: {}",
            status.as_u16(),
            path,
            detail(&body)
        )),
    }
}

/// Pulls FastAPI's `{"detail": ...}` message out of an error body when present.
fn detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Unexpected(format!("Backend request timed out: {}", e))
    } else {
        PortError::Unexpected(format!("Backend request failed: {}", e))
    }
}

/// Wraps an image as a multipart file part.
pub fn image_part(image: &ImageUpload) -> PortResult<Part> {
    Part::bytes(image.bytes.to_vec())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| PortError::Unexpected(format!("Invalid image content type: {}", e)))
}

/// Parses backend timestamps, which may or may not carry a UTC offset.
pub fn parse_timestamp(raw: &str) -> PortResult<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| PortError::Unexpected(format!("Invalid timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn client() -> BackendClient {
        BackendClient::with_client(reqwest::Client::new(), "http://localhost:8000/").unwrap()
    }

    #[test]
    fn endpoint_encodes_segments_and_keeps_trailing_slash() {
        let backend = client();
        assert_eq!(
            backend.endpoint(&["products", ""]).unwrap().as_str(),
            "http://localhost:8000/products/"
        );
        assert_eq!(
            backend.endpoint(&["train", "breeds", "Big Cats"]).unwrap().as_str(),
            "http://localhost:8000/train/breeds/Big%20Cats"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert_matches!(
            BackendClient::with_client(reqwest::Client::new(), "mailto:ops@example.com"),
            Err(BackendSetupError::InvalidUrl(..))
        );
    }

    #[test]
    fn status_errors_map_onto_port_errors() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, "/auth/me", String::new()),
            PortError::Unauthorized
        );
        assert_matches!(
            status_error(StatusCode::NOT_FOUND, "/products/x", r#"{"detail":"Product not found"}"#.to_string()),
            PortError::NotFound(msg) if msg.contains("Product not found")
        );
        assert_matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "/products/", "boom".to_string()),
            PortError::Unexpected(msg) if msg.contains("500") && msg.contains("boom")
        );
    }

    #[test]
    fn parses_naive_and_offset_timestamps() {
        let naive = parse_timestamp("2025-03-01T10:15:30.123456").unwrap();
        let offset = parse_timestamp("2025-03-01T10:15:30.123456Z").unwrap();
        assert_eq!(naive, offset);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
