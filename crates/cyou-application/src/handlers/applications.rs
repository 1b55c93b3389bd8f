//! Application endpoints: submission, listings, status updates, resume
//! download.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cyou_models::{Application, ApplicationId, ApplicationStatus, JobId};
use cyou_store::JobListingFilter;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Default page size for listings.
const DEFAULT_PAGE_SIZE: u32 = 10;
/// Hard cap on page size.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub message: String,
    pub application: Application,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub applications: Vec<Application>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total: u64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

impl ListQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }

    /// Status filter; `all` and absence both mean no filter.
    fn status_filter(&self) -> ApiResult<Option<ApplicationStatus>> {
        match self.status.as_deref() {
            None | Some("all") => Ok(None),
            Some(s) => s
                .parse::<ApplicationStatus>()
                .map(Some)
                .map_err(|_| ApiError::bad_request("Invalid application status")),
        }
    }
}

/// POST /api/v1/application/apply
///
/// Multipart form: `resume` (file, required), `jobId`, `coverLetter`
/// (optional). The resume is staged in the vault first; everything after
/// that point is the submission saga, which deletes the staged file on any
/// failure.
pub async fn submit_application(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApplicationResponse>)> {
    let mut resume: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut job_id: Option<String> = None;
    let mut cover_letter: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("resume") => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("Resume file is required"))?;
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read resume: {e}")))?;
                resume = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("jobId") => {
                job_id = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read jobId: {e}"))
                })?);
            }
            Some("coverLetter") => {
                cover_letter = Some(field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("failed to read coverLetter: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        resume.ok_or_else(|| ApiError::bad_request("Resume file is required"))?;

    // Nothing is on disk yet, so a rejected upload needs no compensation.
    let staged = state
        .vault
        .stage(&file_name, content_type.as_deref(), &bytes)
        .await?;

    // From here on the saga owns the staged file.
    let application = state
        .submission
        .submit(
            &user.id,
            JobId::from_string(job_id.unwrap_or_default()),
            cover_letter,
            staged,
            &user.authorization,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            message: "Application submitted successfully.".to_string(),
            application,
        }),
    ))
}

/// GET /api/v1/application/me
pub async fn get_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Application>>> {
    let applications = state.applications.list_by_applicant(&user.id).await?;
    Ok(Json(applications))
}

/// GET /api/v1/application/job/:job_id
///
/// Applications for a job, visible to the recruiter who owns them or to an
/// admin. Supports `page`, `limit` and `status` query parameters.
pub async fn get_applications_by_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApplicationListResponse>> {
    let job_id = JobId::from_string(job_id);
    if !job_id.is_valid() {
        return Err(ApiError::bad_request("Invalid job id format"));
    }

    let filter = JobListingFilter {
        // admins see every application for the job
        recruiter: (!user.is_admin()).then(|| user.id.clone()),
        status: query.status_filter()?,
    };

    let page = state
        .applications
        .list_by_job(&job_id, &filter, query.page(), query.limit(DEFAULT_PAGE_SIZE))
        .await?;

    Ok(Json(ApplicationListResponse {
        applications: page.items,
        total_pages: page.total_pages,
        current_page: page.page,
        total: page.total,
    }))
}

/// GET /api/v1/application/all (admin only)
pub async fn get_all_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApplicationListResponse>> {
    if !user.is_admin() {
        return Err(ApiError::forbidden(
            "Only administrators can access all applications",
        ));
    }

    let page = state
        .applications
        .list_all(query.page(), query.limit(20))
        .await?;

    Ok(Json(ApplicationListResponse {
        applications: page.items,
        total_pages: page.total_pages,
        current_page: page.page,
        total: page.total,
    }))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PATCH /api/v1/application/:id/status
///
/// Any status may follow any other; there is no transition graph. Every
/// transition is logged for audit.
pub async fn update_application_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(application_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let new_status = body
        .status
        .parse::<ApplicationStatus>()
        .map_err(|_| ApiError::bad_request("Invalid application status"))?;

    let id = ApplicationId::from_string(application_id);
    let mut application = state
        .applications
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    authorize_manager(&application, &user)?;

    let old_status = application.status;
    application.set_status(new_status);
    state
        .applications
        .update_status(&id, new_status, application.updated_at)
        .await?;

    info!(
        application_id = %id,
        old_status = %old_status,
        new_status = %new_status,
        acting_user = %user.id,
        "Application status updated"
    );
    metrics::record_status_update(new_status.as_str());

    Ok(Json(ApplicationResponse {
        message: "Application status updated successfully.".to_string(),
        application,
    }))
}

/// GET /api/v1/application/resume/:id
///
/// Streams the stored resume with `Content-Disposition: attachment`. The
/// reference is resolved against the canonical storage root; anything that
/// escapes it is forbidden whether or not the target exists.
pub async fn download_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(application_id): Path<String>,
) -> ApiResult<Response> {
    let id = ApplicationId::from_string(application_id);
    let application = state
        .applications
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    authorize_manager(&application, &user)?;

    let bytes = state
        .vault
        .read(&application.resume_reference)
        .await
        .map_err(|e| {
            if matches!(e, cyou_files::FileError::NotFound(_)) {
                // store/disk divergence: the row exists but the file is gone
                warn!(
                    application_id = %id,
                    reference = %application.resume_reference,
                    "Resume file missing from storage"
                );
                ApiError::not_found("Resume file not found on server")
            } else {
                e.into()
            }
        })?;

    let filename = application.resume_original_name.replace('"', "");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// Only the recruiter who owns the job, or an admin, may manage an
/// application.
fn authorize_manager(application: &Application, user: &AuthUser) -> ApiResult<()> {
    if application.is_managed_by(&user.id) || user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to manage this application",
        ))
    }
}
