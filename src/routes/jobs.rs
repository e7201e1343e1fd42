use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        employer_dto::CompanyInfo,
        envelope::{ApiResult, PagedResult},
        job_dto::{
            JobListQuery, JobPostingRequest, JobPostingResponse, MyJobsQuery, RelatedJobsQuery,
            TagJobsQuery, UpdateJobStatusRequest,
        },
    },
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    middleware::{auth::require_employer, verified_employer::require_verified_employer},
    models::job_posting::JobStatus,
    repositories::job_posting_repository,
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_jobs))
        .route("/:id", get(get_job))
        .route("/:id/related", get(related_jobs))
        .route("/:id/company", get(job_company))
        .route("/tags/:tag", get(jobs_by_tag));

    let employer = Router::new()
        .route("/my-jobs", get(my_jobs))
        .route_layer(from_fn_with_state(state.clone(), require_employer));

    // The role check is added last so it runs before the verification lookup.
    let verified = Router::new()
        .route("/", post(create_job))
        .route("/:id", put(update_job).delete(delete_job))
        .route("/:id/status", patch(update_job_status))
        .route_layer(from_fn_with_state(state.clone(), require_verified_employer))
        .route_layer(from_fn_with_state(state.clone(), require_employer));

    public.merge(employer).merge(verified)
}

#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JobListQuery>,
) -> Result<PagedResult<JobPostingResponse>> {
    let (jobs, total, paging) = state.job_posting_repository.list_public(&query).await?;
    Ok(PagedResult::new(jobs, total, paging, "Job postings retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<JobPostingResponse>> {
    let job = state.job_posting_repository.get_detail(id).await?;
    Ok(ApiResult::ok(job, "Job posting retrieved successfully"))
}

#[axum::debug_handler]
pub async fn related_jobs(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RelatedJobsQuery>,
) -> Result<ApiResult<Vec<JobPostingResponse>>> {
    let jobs = state.job_posting_repository.related(id, query.count).await?;
    Ok(ApiResult::ok(jobs, "Related job postings retrieved successfully"))
}

#[axum::debug_handler]
pub async fn job_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<CompanyInfo>> {
    let job = job_posting_repository::find(&state.pool, id).await?;
    let company = state.employer_repository.company_info(job.employer_id).await?;
    Ok(ApiResult::ok(company, "Company information retrieved successfully"))
}

#[axum::debug_handler]
pub async fn jobs_by_tag(
    State(state): State<AppState>,
    ApiPath(tag): ApiPath<String>,
    ApiQuery(query): ApiQuery<TagJobsQuery>,
) -> Result<PagedResult<JobPostingResponse>> {
    let (jobs, total, paging) = state.job_posting_repository.by_tag(&tag, &query).await?;
    Ok(PagedResult::new(jobs, total, paging, "Job postings retrieved successfully"))
}

#[axum::debug_handler]
pub async fn my_jobs(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<MyJobsQuery>,
) -> Result<PagedResult<JobPostingResponse>> {
    let (jobs, total, paging) = state.job_posting_repository.my_jobs(user.id, &query).await?;
    Ok(PagedResult::new(jobs, total, paging, "Your job postings retrieved successfully"))
}

#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<JobPostingRequest>,
) -> Result<ApiResult<JobPostingResponse>> {
    payload.validate()?;
    payload.check_salary_range()?;
    let job = state.job_posting_repository.create(user.id, payload).await?;
    Ok(ApiResult::created(job, "Job posting created as draft"))
}

#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<JobPostingRequest>,
) -> Result<ApiResult<JobPostingResponse>> {
    payload.validate()?;
    payload.check_salary_range()?;
    let job = state
        .job_posting_repository
        .update(user.id, id, payload)
        .await?;
    Ok(ApiResult::ok(job, "Job posting updated successfully"))
}

#[axum::debug_handler]
pub async fn update_job_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateJobStatusRequest>,
) -> Result<ApiResult<JobPostingResponse>> {
    let next: JobStatus = payload.status.parse()?;
    let (job, newly_published) = state
        .job_posting_repository
        .update_status(user.id, id, next)
        .await?;
    if newly_published {
        state
            .notification_service
            .notify_job_published(user.id, &job.job_title)
            .await;
    }
    Ok(ApiResult::ok(job, "Job posting status updated successfully"))
}

#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.job_posting_repository.delete(user.id, id).await?;
    Ok(ApiResult::message("Job posting deleted successfully"))
}
