use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use crate::{
    dto::{
        envelope::{ApiResult, PagedResult},
        saved_job_dto::{
            CountResponse, IsSavedResponse, SaveJobRequest, SavedJobResponse, SavedJobsQuery,
        },
    },
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    middleware::auth::require_candidate,
    models::saved_job::SavedJob,
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_saved).post(save_job))
        .route("/:job_id", delete(unsave_job))
        .route("/check/:job_id", get(check_saved))
        .route("/count", get(count_saved))
        .route_layer(from_fn_with_state(state.clone(), require_candidate))
}

#[axum::debug_handler]
pub async fn save_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<SaveJobRequest>,
) -> Result<ApiResult<SavedJob>> {
    let saved = state
        .saved_job_repository
        .save(user.id, payload.job_posting_id)
        .await?;
    Ok(ApiResult::created(saved, "Job saved successfully"))
}

#[axum::debug_handler]
pub async fn unsave_job(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.saved_job_repository.unsave(user.id, job_id).await?;
    Ok(ApiResult::message("Job removed from saved list"))
}

#[axum::debug_handler]
pub async fn list_saved(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<SavedJobsQuery>,
) -> Result<PagedResult<SavedJobResponse>> {
    let (items, total, paging) = state.saved_job_repository.list(user.id, &query).await?;
    Ok(PagedResult::new(items, total, paging, "Saved jobs retrieved successfully"))
}

#[axum::debug_handler]
pub async fn check_saved(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<ApiResult<IsSavedResponse>> {
    let is_saved = state.saved_job_repository.is_saved(user.id, job_id).await?;
    Ok(ApiResult::ok(IsSavedResponse { is_saved }, "Saved check completed"))
}

#[axum::debug_handler]
pub async fn count_saved(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<CountResponse>> {
    let count = state.saved_job_repository.count(user.id).await?;
    Ok(ApiResult::ok(CountResponse { count }, "Saved job count retrieved"))
}
