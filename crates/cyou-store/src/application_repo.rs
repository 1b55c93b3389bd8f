//! Application repository.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Row};
use tracing::debug;

use cyou_models::{
    ApplicantSnapshot, Application, ApplicationId, ApplicationStatus, JobId, JobSnapshot, UserId,
};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A page of query results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Listing filter for per-job queries.
#[derive(Debug, Clone, Default)]
pub struct JobListingFilter {
    /// Restrict to applications owned by this recruiter (admins pass `None`)
    pub recruiter: Option<UserId>,
    /// Restrict to a single status
    pub status: Option<ApplicationStatus>,
}

const SELECT_COLUMNS: &str = "id, job_id, applicant_id, recruiter_id, status, \
     job_snapshot, applicant_snapshot, resume_reference, resume_original_name, \
     cover_letter, created_at, updated_at";

/// Repository for `Application` rows.
#[derive(Clone)]
pub struct ApplicationRepo {
    db: Database,
}

impl ApplicationRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new application.
    ///
    /// A unique-index violation on `(job_id, applicant_id)` surfaces as
    /// `StoreError::Duplicate`; the caller must treat that as a lost race,
    /// not a storage fault.
    pub async fn insert(&self, app: &Application) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO applications \
             (id, job_id, applicant_id, recruiter_id, status, job_snapshot, \
              applicant_snapshot, resume_reference, resume_original_name, \
              cover_letter, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(app.id.as_str())
        .bind(app.job.as_str())
        .bind(app.applicant.as_str())
        .bind(app.recruiter.as_str())
        .bind(app.status.as_str())
        .bind(Json(&app.job_snapshot))
        .bind(Json(&app.applicant_snapshot))
        .bind(&app.resume_reference)
        .bind(&app.resume_original_name)
        .bind(&app.cover_letter)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(self.db.pool())
        .await?;

        debug!(application_id = %app.id, job_id = %app.job, "Inserted application");
        Ok(())
    }

    /// Find an application for a `(job, applicant)` pair.
    pub async fn find_by_job_and_applicant(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> StoreResult<Option<Application>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM applications WHERE job_id = $1 AND applicant_id = $2"
        ))
        .bind(job.as_str())
        .bind(applicant.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_application).transpose()
    }

    /// Find an application by id.
    pub async fn find_by_id(&self, id: &ApplicationId) -> StoreResult<Option<Application>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_application).transpose()
    }

    /// Update the status of an application.
    ///
    /// Fails with `NotFound` if the row is gone. Snapshots and references
    /// are never touched here.
    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE applications SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(updated_at)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("application {id}")));
        }
        Ok(())
    }

    /// All applications submitted by an applicant, newest first.
    pub async fn list_by_applicant(&self, applicant: &UserId) -> StoreResult<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM applications \
             WHERE applicant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(applicant.as_str())
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_application).collect()
    }

    /// Paginated applications for a job, optionally filtered by recruiter
    /// ownership and status.
    pub async fn list_by_job(
        &self,
        job: &JobId,
        filter: &JobListingFilter,
        page: u32,
        limit: u32,
    ) -> StoreResult<Page<Application>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM applications WHERE job_id = ");
        count.push_bind(job.as_str());
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.db.pool()).await?;

        let mut query = QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM applications WHERE job_id = "
        ));
        query.push_bind(job.as_str());
        push_filter(&mut query, filter);
        push_page(&mut query, page, limit);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        let items = rows
            .into_iter()
            .map(row_to_application)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(paged(items, total, page, limit))
    }

    /// Paginated view over every application (admin overview).
    pub async fn list_all(&self, page: u32, limit: u32) -> StoreResult<Page<Application>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(self.db.pool())
            .await?;

        let mut query = QueryBuilder::new(format!(
            "SELECT {SELECT_COLUMNS} FROM applications WHERE TRUE"
        ));
        push_page(&mut query, page, limit);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        let items = rows
            .into_iter()
            .map(row_to_application)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(paged(items, total, page, limit))
    }
}

fn push_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &JobListingFilter) {
    if let Some(recruiter) = &filter.recruiter {
        query.push(" AND recruiter_id = ");
        query.push_bind(recruiter.as_str().to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
}

fn push_page(query: &mut QueryBuilder<'_, sqlx::Postgres>, page: u32, limit: u32) {
    let offset = (page.max(1) - 1) as i64 * limit as i64;
    query.push(" ORDER BY created_at DESC LIMIT ");
    query.push_bind(limit as i64);
    query.push(" OFFSET ");
    query.push_bind(offset);
}

fn paged<T>(items: Vec<T>, total: i64, page: u32, limit: u32) -> Page<T> {
    let total = total.max(0) as u64;
    let total_pages = if limit == 0 {
        0
    } else {
        total.div_ceil(limit as u64) as u32
    };
    Page {
        items,
        total,
        page: page.max(1),
        total_pages,
    }
}

fn row_to_application(row: PgRow) -> StoreResult<Application> {
    let Json(job_snapshot): Json<JobSnapshot> = row.try_get("job_snapshot")?;
    let Json(applicant_snapshot): Json<ApplicantSnapshot> = row.try_get("applicant_snapshot")?;

    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ApplicationStatus>()
        .map_err(|e| StoreError::Serialization(serde_json::Error::io(std::io::Error::other(e))))?;

    Ok(Application {
        id: ApplicationId::from_string(row.try_get::<String, _>("id")?),
        job: JobId::from_string(row.try_get::<String, _>("job_id")?),
        applicant: UserId::from_string(row.try_get::<String, _>("applicant_id")?),
        recruiter: UserId::from_string(row.try_get::<String, _>("recruiter_id")?),
        status,
        job_snapshot,
        applicant_snapshot,
        resume_reference: row.try_get("resume_reference")?,
        resume_original_name: row.try_get("resume_original_name")?,
        cover_letter: row.try_get("cover_letter")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
