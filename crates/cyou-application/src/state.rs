//! Application state.

use std::sync::Arc;

use cyou_clients::{JobsClient, ProfileClient};
use cyou_files::ResumeVault;
use cyou_store::{ApplicationRepo, Database};

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::services::submission::ResumeStage;
use crate::services::SubmissionService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub db: Database,
    pub applications: ApplicationRepo,
    pub vault: Arc<ResumeVault>,
    pub verifier: Arc<TokenVerifier>,
    pub submission: SubmissionService,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let db = Database::from_env().await?;
        let applications = ApplicationRepo::new(db.clone());
        let vault = Arc::new(ResumeVault::open(&config.uploads_dir)?);
        let verifier = Arc::new(TokenVerifier::new(&config.jwt_secret));

        let jobs = Arc::new(JobsClient::from_env()?);
        let profiles = Arc::new(ProfileClient::from_env()?);
        let files: Arc<dyn ResumeStage> = vault.clone();

        let submission = SubmissionService::new(
            jobs,
            profiles,
            Arc::new(applications.clone()),
            files,
        );

        Ok(Self {
            config,
            db,
            applications,
            vault,
            verifier,
            submission,
        })
    }
}
