//! Jobs service HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use cyou_models::JobId;

use crate::error::{ClientError, ClientResult};
use crate::retry::with_retry;

/// Configuration for the Jobs client.
#[derive(Debug, Clone)]
pub struct JobsClientConfig {
    /// Base URL of the Jobs service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for transport failures
    pub max_retries: u32,
}

impl Default for JobsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

impl JobsClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("JOBS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("JOBS_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: std::env::var("JOBS_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Job metadata as served by the Jobs service.
///
/// Older job records use `company`/`recruiterId`; the aliases keep both
/// shapes readable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub title: String,
    #[serde(alias = "company")]
    pub company_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
    /// Job posting status; a record without one is treated as open
    #[serde(default)]
    pub status: Option<String>,
    /// Recruiter who owns the posting
    #[serde(alias = "recruiterId", default)]
    pub posted_by: Option<String>,
}

impl JobDetails {
    /// Whether the job still accepts applications.
    pub fn is_open(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(status) => status == "Open",
        }
    }
}

/// Client for the Jobs service.
pub struct JobsClient {
    http: Client,
    config: JobsClientConfig,
}

impl JobsClient {
    /// Create a new Jobs client.
    pub fn new(config: JobsClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(JobsClientConfig::from_env())
    }

    /// Fetch job metadata by id.
    pub async fn fetch_job(&self, job_id: &JobId) -> ClientResult<JobDetails> {
        let url = format!("{}/api/jobs/{}", self.config.base_url, job_id);

        debug!(job_id = %job_id, "Fetching job details from {}", url);

        let response = with_retry("jobs", self.config.max_retries, || async {
            self.http
                .get(&url)
                .send()
                .await
                .map_err(ClientError::Network)
        })
        .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(format!("job {job_id}"))),
            status if status.is_success() => {
                let details: JobDetails = response.json().await?;
                Ok(details)
            }
            status if status.is_server_error() => Err(ClientError::ServiceUnavailable(format!(
                "jobs service returned {status}"
            ))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::RequestFailed(format!(
                    "jobs service returned {status}: {body}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> JobsClient {
        JobsClient::new(JobsClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            max_retries: 0,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = JobsClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_is_open() {
        let mut job = JobDetails {
            title: "t".into(),
            company_name: "c".into(),
            location: None,
            job_type: None,
            status: None,
            posted_by: None,
        };
        assert!(job.is_open());
        job.status = Some("Open".into());
        assert!(job.is_open());
        job.status = Some("Closed".into());
        assert!(!job.is_open());
        job.status = Some("Draft".into());
        assert!(!job.is_open());
    }

    #[tokio::test]
    async fn test_fetch_job_success_with_legacy_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Backend Engineer",
                "company": "Acme",
                "location": "Remote",
                "type": "Full-time",
                "status": "Open",
                "recruiterId": "recruiter-1"
            })))
            .mount(&server)
            .await;

        let job = client_for(&server)
            .fetch_job(&JobId::from_string("job-1"))
            .await
            .unwrap();

        assert_eq!(job.company_name, "Acme");
        assert_eq!(job.posted_by.as_deref(), Some("recruiter-1"));
        assert!(job.is_open());
    }

    #[tokio::test]
    async fn test_fetch_job_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_job(&JobId::from_string("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_job_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/job-1"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_job(&JobId::from_string("job-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
    }
}
