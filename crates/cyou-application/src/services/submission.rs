//! The application-submission saga.
//!
//! A submission touches two sibling services, the local store and a staged
//! file. There is no distributed transaction: the staged resume is the only
//! side effect that exists before the store write, so every failure after
//! staging compensates by deleting it. On success the file is owned by the
//! application row and must not be touched.
//!
//! Duplicate submissions racing between the pre-check and the insert are
//! resolved by the store's unique index; the resulting duplicate error is a
//! conflict, not a storage fault.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

use cyou_clients::{ClientError, ClientResult, JobDetails, JobsClient, ProfileClient};
use cyou_files::{FileResult, ResumeVault, StagedResume};
use cyou_models::{ApplicantSnapshot, Application, JobId, UserId};
use cyou_store::{ApplicationRepo, StoreError, StoreResult};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Job lookup capability.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn fetch_job(&self, job_id: &JobId) -> ClientResult<JobDetails>;
}

#[async_trait]
impl JobDirectory for JobsClient {
    async fn fetch_job(&self, job_id: &JobId) -> ClientResult<JobDetails> {
        JobsClient::fetch_job(self, job_id).await
    }
}

/// Profile lookup capability. Takes the caller's original `Authorization`
/// header value, forwarded verbatim.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn fetch_me(&self, authorization: &str) -> ClientResult<ApplicantSnapshot>;
}

#[async_trait]
impl ProfileDirectory for ProfileClient {
    async fn fetch_me(&self, authorization: &str) -> ClientResult<ApplicantSnapshot> {
        ProfileClient::fetch_me(self, authorization).await
    }
}

/// The slice of the store the saga needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApplicationRecords: Send + Sync {
    async fn find_by_job_and_applicant(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> StoreResult<Option<Application>>;

    async fn insert(&self, app: &Application) -> StoreResult<()>;
}

#[async_trait]
impl ApplicationRecords for ApplicationRepo {
    async fn find_by_job_and_applicant(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> StoreResult<Option<Application>> {
        ApplicationRepo::find_by_job_and_applicant(self, job, applicant).await
    }

    async fn insert(&self, app: &Application) -> StoreResult<()> {
        ApplicationRepo::insert(self, app).await
    }
}

/// Compensation seam: delete a staged file by reference.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResumeStage: Send + Sync {
    async fn discard(&self, reference: &str) -> FileResult<()>;
}

#[async_trait]
impl ResumeStage for ResumeVault {
    async fn discard(&self, reference: &str) -> FileResult<()> {
        ResumeVault::discard(self, reference).await
    }
}

/// Orchestrates application submission.
#[derive(Clone)]
pub struct SubmissionService {
    jobs: Arc<dyn JobDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
    records: Arc<dyn ApplicationRecords>,
    files: Arc<dyn ResumeStage>,
}

impl SubmissionService {
    pub fn new(
        jobs: Arc<dyn JobDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
        records: Arc<dyn ApplicationRecords>,
        files: Arc<dyn ResumeStage>,
    ) -> Self {
        Self {
            jobs,
            profiles,
            records,
            files,
        }
    }

    /// Submit an application for `applicant` to `job_id`.
    ///
    /// `staged` must already exist in the vault. On success the file is
    /// retained and exactly one row is written; on any failure the file is
    /// deleted (best-effort) and no row exists.
    ///
    /// The saga runs on its own task, awaited from here. A caller that
    /// disconnects mid-flight drops this future but not the task, so the
    /// staged file always ends up either adopted or deleted.
    pub async fn submit(
        &self,
        applicant: &UserId,
        job_id: JobId,
        cover_letter: Option<String>,
        staged: StagedResume,
        authorization: &str,
    ) -> ApiResult<Application> {
        let service = self.clone();
        let applicant = applicant.clone();
        let authorization = authorization.to_string();

        let saga = tokio::spawn(async move {
            match service
                .run(&applicant, &job_id, cover_letter, &staged, &authorization)
                .await
            {
                Ok(application) => {
                    metrics::record_submission("accepted");
                    info!(
                        application_id = %application.id,
                        job_id = %job_id,
                        applicant_id = %applicant,
                        "Application submitted"
                    );
                    Ok(application)
                }
                Err(err) => {
                    metrics::record_submission("rejected");
                    // Compensation is best-effort: a failed delete is logged
                    // and the primary error is what the caller sees.
                    if let Err(cleanup) = service.files.discard(&staged.reference).await {
                        warn!(
                            reference = %staged.reference,
                            error = %cleanup,
                            "Failed to delete staged resume during compensation"
                        );
                    }
                    Err(err)
                }
            }
        });

        saga.await
            .map_err(|e| ApiError::internal(format!("submission task failed: {e}")))?
    }

    async fn run(
        &self,
        applicant: &UserId,
        job_id: &JobId,
        cover_letter: Option<String>,
        staged: &StagedResume,
        authorization: &str,
    ) -> ApiResult<Application> {
        if !job_id.is_valid() {
            return Err(ApiError::bad_request("Valid job id is required"));
        }

        if self
            .records
            .find_by_job_and_applicant(job_id, applicant)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict("You have already applied for this job"));
        }

        let job = match self.jobs.fetch_job(job_id).await {
            Ok(job) => job,
            Err(ClientError::NotFound(_)) => {
                return Err(ApiError::not_found("Job not found"));
            }
            Err(e) => {
                return Err(ApiError::dependency_unavailable(format!(
                    "could not verify job with the jobs service: {e}"
                )));
            }
        };

        if !job.is_open() {
            return Err(ApiError::invalid_state("Job is no longer open"));
        }

        // The recruiter is derived here and nowhere else; a job record
        // without ownership data must not silently produce an application
        // no recruiter can see.
        let recruiter = job
            .posted_by
            .clone()
            .map(UserId::from_string)
            .ok_or_else(|| {
                ApiError::DependencyDataInvalid(format!(
                    "job {job_id} is missing recruiter information"
                ))
            })?;

        let profile = self.profiles.fetch_me(authorization).await.map_err(|e| {
            ApiError::dependency_unavailable(format!(
                "could not retrieve applicant profile: {e}"
            ))
        })?;

        let application = Application::new(
            job_id.clone(),
            cyou_models::JobSnapshot {
                title: job.title,
                company_name: job.company_name,
                location: job.location,
                job_type: job.job_type,
            },
            applicant.clone(),
            profile,
            recruiter,
            staged.reference.clone(),
            staged.original_name.clone(),
            cover_letter.filter(|c| !c.trim().is_empty()),
        );

        match self.records.insert(&application).await {
            Ok(()) => Ok(application),
            // Lost the race against a concurrent submission for the same
            // (job, applicant) pair: the unique index is the authority.
            Err(StoreError::Duplicate(_)) => {
                Err(ApiError::conflict("You have already applied for this job"))
            }
            Err(e) => Err(ApiError::Storage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockall::predicate::eq;

    use cyou_files::FileError;

    const VALID_JOB: &str = "5f3c7c1e-0000-4000-8000-000000000001";

    fn open_job() -> JobDetails {
        serde_json::from_value(serde_json::json!({
            "title": "Backend Engineer",
            "companyName": "Acme",
            "location": "Remote",
            "type": "Full-time",
            "status": "Open",
            "postedBy": "recruiter-1"
        }))
        .unwrap()
    }

    fn staged() -> StagedResume {
        StagedResume {
            reference: "resumes/resume-1.pdf".to_string(),
            original_name: "cv.pdf".to_string(),
        }
    }

    struct Mocks {
        jobs: MockJobDirectory,
        profiles: MockProfileDirectory,
        records: MockApplicationRecords,
        files: MockResumeStage,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                jobs: MockJobDirectory::new(),
                profiles: MockProfileDirectory::new(),
                records: MockApplicationRecords::new(),
                files: MockResumeStage::new(),
            }
        }

        /// Expect exactly one compensation delete of the staged file.
        fn expect_compensation(&mut self) {
            self.files
                .expect_discard()
                .with(eq("resumes/resume-1.pdf"))
                .times(1)
                .returning(|_| Ok(()));
        }

        fn service(self) -> SubmissionService {
            SubmissionService::new(
                Arc::new(self.jobs),
                Arc::new(self.profiles),
                Arc::new(self.records),
                Arc::new(self.files),
            )
        }
    }

    async fn submit(service: SubmissionService) -> ApiResult<Application> {
        service
            .submit(
                &UserId::from_string("applicant-1"),
                JobId::from_string(VALID_JOB),
                Some("I would like to apply".to_string()),
                staged(),
                "Bearer token-123",
            )
            .await
    }

    #[tokio::test]
    async fn test_successful_submission_retains_file() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .times(1)
            .returning(|_, _| Ok(None));
        mocks
            .jobs
            .expect_fetch_job()
            .with(eq(JobId::from_string(VALID_JOB)))
            .times(1)
            .returning(|_| Ok(open_job()));
        mocks
            .profiles
            .expect_fetch_me()
            .with(eq("Bearer token-123"))
            .times(1)
            .returning(|_| {
                Ok(ApplicantSnapshot {
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    ..Default::default()
                })
            });
        mocks.records.expect_insert().times(1).returning(|_| Ok(()));
        // success path must never delete the staged file
        mocks.files.expect_discard().times(0);

        let application = submit(mocks.service()).await.unwrap();

        assert_eq!(application.status, cyou_models::ApplicationStatus::Applied);
        assert_eq!(application.recruiter, UserId::from_string("recruiter-1"));
        assert_eq!(application.job_snapshot.title, "Backend Engineer");
        assert_eq!(application.applicant_snapshot.first_name, "Ada");
        assert_eq!(application.resume_reference, "resumes/resume-1.pdf");
        assert_eq!(
            application.cover_letter.as_deref(),
            Some("I would like to apply")
        );
    }

    #[tokio::test]
    async fn test_invalid_job_id_compensates() {
        let mut mocks = Mocks::new();
        mocks.expect_compensation();
        let service = mocks.service();

        let err = service
            .submit(
                &UserId::from_string("applicant-1"),
                JobId::from_string("not-a-uuid"),
                None,
                staged(),
                "Bearer token-123",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_duplicate_precheck_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .times(1)
            .returning(|job, applicant| {
                Ok(Some(Application::new(
                    job.clone(),
                    cyou_models::JobSnapshot {
                        title: "t".into(),
                        company_name: "c".into(),
                        location: None,
                        job_type: None,
                    },
                    applicant.clone(),
                    ApplicantSnapshot::default(),
                    UserId::from_string("recruiter-1"),
                    "resumes/old.pdf",
                    "old.pdf",
                    None,
                )))
            });
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_job_not_found_compensates() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks
            .jobs
            .expect_fetch_job()
            .returning(|_| Err(ClientError::NotFound("job".into())));
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_closed_job_is_invalid_state() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks.jobs.expect_fetch_job().returning(|_| {
            let mut job = open_job();
            job.status = Some("Closed".to_string());
            Ok(job)
        });
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_job_without_recruiter_is_dependency_data_invalid() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks.jobs.expect_fetch_job().returning(|_| {
            let mut job = open_job();
            job.posted_by = None;
            Ok(job)
        });
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::DependencyDataInvalid(_)));
    }

    #[tokio::test]
    async fn test_jobs_transport_error_is_dependency_unavailable() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks
            .jobs
            .expect_fetch_job()
            .returning(|_| Err(ClientError::ServiceUnavailable("503".into())));
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_profile_failure_compensates() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks.jobs.expect_fetch_job().returning(|_| Ok(open_job()));
        mocks
            .profiles
            .expect_fetch_me()
            .returning(|_| Err(ClientError::RequestFailed("401".into())));
        mocks.records.expect_insert().times(0);
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_insert_race_is_conflict() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks.jobs.expect_fetch_job().returning(|_| Ok(open_job()));
        mocks
            .profiles
            .expect_fetch_me()
            .returning(|_| Ok(ApplicantSnapshot::default()));
        mocks
            .records
            .expect_insert()
            .returning(|_| Err(StoreError::duplicate("applications_job_applicant_idx")));
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_other_insert_failure_is_storage_error() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks.jobs.expect_fetch_job().returning(|_| Ok(open_job()));
        mocks
            .profiles
            .expect_fetch_me()
            .returning(|_| Ok(ApplicantSnapshot::default()));
        mocks
            .records
            .expect_insert()
            .returning(|_| Err(StoreError::config_error("pool exhausted")));
        mocks.expect_compensation();

        let err = submit(mocks.service()).await.unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }

    /// Jobs stub whose lookup stays pending long enough for the caller to
    /// give up before it resolves.
    struct SlowFailingJobs;

    #[async_trait]
    impl JobDirectory for SlowFailingJobs {
        async fn fetch_job(&self, _job_id: &JobId) -> ClientResult<JobDetails> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(ClientError::NotFound("job".into()))
        }
    }

    #[tokio::test]
    async fn test_real_vault_backs_the_compensation_seam() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Arc::new(ResumeVault::open(dir.path()).unwrap());
        let staged = vault.stage("cv.pdf", None, b"%PDF-1.4").await.unwrap();
        let reference = staged.reference.clone();

        let mut records = MockApplicationRecords::new();
        records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        let mut jobs = MockJobDirectory::new();
        jobs.expect_fetch_job()
            .returning(|_| Err(ClientError::NotFound("job".into())));

        let service = SubmissionService::new(
            Arc::new(jobs),
            Arc::new(MockProfileDirectory::new()),
            Arc::new(records),
            vault.clone(),
        );

        let err = service
            .submit(
                &UserId::from_string("applicant-1"),
                JobId::from_string(VALID_JOB),
                None,
                staged,
                "Bearer token-123",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        // compensation went through the real vault
        assert!(matches!(
            vault.read(&reference).await.unwrap_err(),
            FileError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_dropped_caller_still_compensates() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Arc::new(ResumeVault::open(dir.path()).unwrap());
        let staged = vault.stage("cv.pdf", None, b"%PDF-1.4").await.unwrap();
        let reference = staged.reference.clone();

        let mut records = MockApplicationRecords::new();
        records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));

        let service = SubmissionService::new(
            Arc::new(SlowFailingJobs),
            Arc::new(MockProfileDirectory::new()),
            Arc::new(records),
            vault.clone(),
        );

        // the caller gives up while the job lookup is still pending
        let applicant = UserId::from_string("applicant-1");
        let submit = service.submit(
            &applicant,
            JobId::from_string(VALID_JOB),
            None,
            staged,
            "Bearer token-123",
        );
        assert!(tokio::time::timeout(Duration::from_millis(10), submit)
            .await
            .is_err());

        // the detached saga still finishes and deletes the staged file
        for _ in 0..100 {
            if vault.read(&reference).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(matches!(
            vault.read(&reference).await.unwrap_err(),
            FileError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_primary_error() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_find_by_job_and_applicant()
            .returning(|_, _| Ok(None));
        mocks
            .jobs
            .expect_fetch_job()
            .returning(|_| Err(ClientError::NotFound("job".into())));
        mocks
            .files
            .expect_discard()
            .times(1)
            .returning(|_| Err(cyou_files::FileError::config_error("disk detached")));

        let err = submit(mocks.service()).await.unwrap_err();
        // the cleanup failure is swallowed; the caller sees the lookup error
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
