//! Profile service HTTP client.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::debug;

use cyou_models::ApplicantSnapshot;

use crate::error::{ClientError, ClientResult};
use crate::retry::with_retry;

/// Configuration for the Profile client.
#[derive(Debug, Clone)]
pub struct ProfileClientConfig {
    /// Base URL of the Profile service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for transport failures
    pub max_retries: u32,
}

impl Default for ProfileClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3002".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

impl ProfileClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PROFILE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            timeout: Duration::from_secs(
                std::env::var("PROFILE_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: std::env::var("PROFILE_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the Profile service.
pub struct ProfileClient {
    http: Client,
    config: ProfileClientConfig,
}

impl ProfileClient {
    /// Create a new Profile client.
    pub fn new(config: ProfileClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ProfileClientConfig::from_env())
    }

    /// Fetch the caller's own profile snapshot.
    ///
    /// `authorization` is the caller's original `Authorization` header value,
    /// forwarded verbatim. This service never mints or re-signs credentials
    /// on a user's behalf.
    pub async fn fetch_me(&self, authorization: &str) -> ClientResult<ApplicantSnapshot> {
        let url = format!("{}/api/v1/profile/me", self.config.base_url);

        debug!("Fetching profile snapshot from {}", url);

        let response = with_retry("profile", self.config.max_retries, || async {
            self.http
                .get(&url)
                .header(AUTHORIZATION, authorization)
                .send()
                .await
                .map_err(ClientError::Network)
        })
        .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ClientError::ServiceUnavailable(format!(
                "profile service returned {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::RequestFailed(format!(
                "profile service returned {status}: {body}"
            )));
        }

        let snapshot: ApplicantSnapshot = response.json().await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProfileClient {
        ProfileClient::new(ProfileClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            max_retries: 0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_me_forwards_bearer_and_tolerates_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile/me"))
            .and(header("Authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com"
            })))
            .mount(&server)
            .await;

        let snapshot = client_for(&server).fetch_me("Bearer token-123").await.unwrap();

        assert_eq!(snapshot.first_name, "Ada");
        assert_eq!(snapshot.email, "ada@example.com");
        // missing optional fields come back empty, not as an error
        assert!(snapshot.phone.is_none());
        assert!(snapshot.skills.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_me_unauthorized_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_me("Bearer bad").await.unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_me_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile/me"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_me("Bearer tok").await.unwrap_err();
        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
    }
}
