//! The `Application` aggregate.
//!
//! An application links a job and an applicant owned by sibling services.
//! Because those records can change or disappear after submission, the
//! aggregate carries immutable snapshots of both, captured once at creation
//! and never refreshed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, JobId, UserId};
use crate::status::ApplicationStatus;

/// Snapshot of job fields at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub title: String,
    pub company_name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Employment type, e.g. Full-time or Internship
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
}

/// Snapshot of applicant profile fields at submission time.
///
/// Fields the Profile service did not return are stored empty rather than
/// failing the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSnapshot {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A job application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Unique application ID
    pub id: ApplicationId,

    /// Referenced job (owned by the Jobs service, never populated locally)
    pub job: JobId,

    /// Job fields captured at submission time
    pub job_snapshot: JobSnapshot,

    /// Referenced applicant (owned by the Auth service)
    pub applicant: UserId,

    /// Applicant profile fields captured at submission time
    pub applicant_snapshot: ApplicantSnapshot,

    /// Recruiter who posted the job. Always derived from the Jobs service
    /// response, never taken from the caller.
    pub recruiter: UserId,

    /// Current status
    pub status: ApplicationStatus,

    /// Opaque reference to the staged resume file
    pub resume_reference: String,

    /// Original resume filename, kept for download
    pub resume_original_name: String,

    /// Optional cover letter text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Build a new application in the `Applied` state.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job: JobId,
        job_snapshot: JobSnapshot,
        applicant: UserId,
        applicant_snapshot: ApplicantSnapshot,
        recruiter: UserId,
        resume_reference: impl Into<String>,
        resume_original_name: impl Into<String>,
        cover_letter: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            job,
            job_snapshot,
            applicant,
            applicant_snapshot,
            recruiter,
            status: ApplicationStatus::Applied,
            resume_reference: resume_reference.into(),
            resume_original_name: resume_original_name.into(),
            cover_letter,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status and bump `updated_at`.
    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Check whether a user may manage this application (status updates,
    /// resume download). Only the owning recruiter qualifies; admin checks
    /// happen at the API layer where the role is known.
    pub fn is_managed_by(&self, user: &UserId) -> bool {
        &self.recruiter == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Application {
        Application::new(
            JobId::from_string("5f3c7c1e-0000-4000-8000-000000000001"),
            JobSnapshot {
                title: "Backend Engineer".into(),
                company_name: "Acme".into(),
                location: Some("Remote".into()),
                job_type: Some("Full-time".into()),
            },
            UserId::from_string("applicant-1"),
            ApplicantSnapshot::default(),
            UserId::from_string("recruiter-1"),
            "resumes/resume-abc.pdf",
            "cv.pdf",
            None,
        )
    }

    #[test]
    fn test_new_application_defaults() {
        let app = sample();
        assert_eq!(app.status, ApplicationStatus::Applied);
        assert_eq!(app.created_at, app.updated_at);
        assert!(app.cover_letter.is_none());
    }

    #[test]
    fn test_set_status_bumps_updated_at() {
        let mut app = sample();
        let created = app.created_at;
        app.set_status(ApplicationStatus::Reviewed);
        assert_eq!(app.status, ApplicationStatus::Reviewed);
        assert!(app.updated_at >= created);
        // snapshots are untouched by status changes
        assert_eq!(app.job_snapshot.title, "Backend Engineer");
    }

    #[test]
    fn test_managed_by_recruiter_only() {
        let app = sample();
        assert!(app.is_managed_by(&UserId::from_string("recruiter-1")));
        assert!(!app.is_managed_by(&UserId::from_string("applicant-1")));
    }
}
