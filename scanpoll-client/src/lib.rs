//! ScanCode.io HTTP Client
//!
//! A small, typed client for the one ScanCode.io endpoint the poller needs:
//! fetching a project together with its runs.
//!
//! # Example
//!
//! ```no_run
//! use scanpoll_client::ScanCodeClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> scanpoll_client::Result<()> {
//!     let client = ScanCodeClient::new(
//!         "https://scancode.example.com",
//!         "api-token",
//!         Duration::from_secs(15),
//!     )?;
//!
//!     let project = client.get_project("5f2cdda6-fe9a-4e5e-8b4d-8f8f0e1e2b3c").await?;
//!     println!("Run status: {}", project.run_status());
//!     Ok(())
//! }
//! ```

pub mod error;
mod projects;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use scanpoll_core::domain::project::ProjectSnapshot;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// HTTP client for the ScanCode.io REST API
///
/// Every request carries `Authorization: Token <token>` and asks for JSON.
/// The per-request timeout covers connecting, sending and reading the body.
#[derive(Clone)]
pub struct ScanCodeClient {
    /// Base URL of the service, without trailing slash
    base_url: String,
    /// HTTP client instance with auth headers preinstalled
    client: Client,
}

impl ScanCodeClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of ScanCode.io (e.g., "https://scancode.example.com")
    /// * `token` - API token
    /// * `request_timeout` - Timeout applied to every request
    pub fn new(
        base_url: impl Into<String>,
        token: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|_| ClientError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .user_agent(concat!("scanpoll/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(base_url, client))
    }

    /// Create a client around a preconfigured reqwest `Client`
    ///
    /// The caller is responsible for authentication headers and timeouts.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and decode a JSON body
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl fmt::Debug for ScanCodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanCodeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ScanCodeClient {
        ScanCodeClient::new(base_url, "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client("http://localhost:8001");
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = client("http://localhost:8001/");
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = ScanCodeClient::with_client("http://localhost:8001//", Client::new());
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let err = ScanCodeClient::new("http://localhost:8001", "bad\ntoken", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidToken));
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", client("http://localhost:8001"));
        assert!(!rendered.contains("secret"));
    }
}
