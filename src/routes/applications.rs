use axum::{
    extract::{Multipart, State},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationDetail, ApplicationResponse, ApplicationStatistics, ApplyRequest,
            EmployerApplicationsQuery, HasAppliedResponse, MyApplicationsQuery,
            UpdateApplicationStatusRequest,
        },
        envelope::{ApiResult, PagedResult},
    },
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    middleware::{
        auth::{require_candidate, require_employer},
        verified_employer::require_verified_employer,
    },
    models::job_application::ApplicationStatus,
    utils::upload::{self, MultipartForm},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let candidate = Router::new()
        .route("/", post(apply))
        .route("/my-applications", get(my_applications))
        .route("/:id", get(get_application).delete(withdraw))
        .route("/check/:job_id", get(check_applied))
        .route_layer(from_fn_with_state(state.clone(), require_candidate));

    let employer = Router::new()
        .route("/employer/all", get(employer_applications))
        .route("/employer/job/:job_id", get(job_applications))
        .route("/employer/statistics", get(statistics))
        .route("/employer/:id", get(employer_application))
        .route_layer(from_fn_with_state(state.clone(), require_employer));

    let verified = Router::new()
        .route("/employer/:id/status", patch(update_status))
        .route_layer(from_fn_with_state(state.clone(), require_verified_employer))
        .route_layer(from_fn_with_state(state.clone(), require_employer));

    candidate.merge(employer).merge(verified)
}

/// Multipart apply; an attached `cvFile` overrides the profile CV.
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<ApiResult<ApplicationResponse>> {
    let mut form = MultipartForm::read(multipart).await?;
    let payload = ApplyRequest::from_form(&form)?;
    payload.validate()?;

    let cv_upload = match form.take_file("cvFile") {
        Some(file) => Some(upload::accept(&upload::APPLICATION_CV, Some(file))?),
        None => None,
    };

    let application = state
        .job_application_repository
        .apply(user.id, payload, cv_upload)
        .await?;
    state
        .notification_service
        .notify_new_application(
            application.employer_id,
            &application.candidate_name,
            &application.job_title,
        )
        .await;
    Ok(ApiResult::created(application, "Application submitted successfully"))
}

#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<MyApplicationsQuery>,
) -> Result<PagedResult<ApplicationResponse>> {
    let (items, total, paging) = state
        .job_application_repository
        .my_applications(user.id, &query)
        .await?;
    Ok(PagedResult::new(items, total, paging, "Applications retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<ApplicationResponse>> {
    let application = state.job_application_repository.get_own(user.id, id).await?;
    Ok(ApiResult::ok(application, "Application retrieved successfully"))
}

#[axum::debug_handler]
pub async fn withdraw(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.job_application_repository.withdraw(user.id, id).await?;
    Ok(ApiResult::message("Application withdrawn successfully"))
}

#[axum::debug_handler]
pub async fn check_applied(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(job_id): ApiPath<Uuid>,
) -> Result<ApiResult<HasAppliedResponse>> {
    let has_applied = state
        .job_application_repository
        .has_applied(user.id, job_id)
        .await?;
    Ok(ApiResult::ok(
        HasAppliedResponse { has_applied },
        "Application check completed",
    ))
}

#[axum::debug_handler]
pub async fn employer_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<EmployerApplicationsQuery>,
) -> Result<PagedResult<ApplicationResponse>> {
    let (items, total, paging) = state
        .job_application_repository
        .employer_all(user.id, &query)
        .await?;
    Ok(PagedResult::new(items, total, paging, "Applications retrieved successfully"))
}

#[axum::debug_handler]
pub async fn job_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(job_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<EmployerApplicationsQuery>,
) -> Result<PagedResult<ApplicationResponse>> {
    let (items, total, paging) = state
        .job_application_repository
        .employer_by_job(user.id, job_id, &query)
        .await?;
    Ok(PagedResult::new(items, total, paging, "Applications retrieved successfully"))
}

#[axum::debug_handler]
pub async fn employer_application(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<ApplicationDetail>> {
    let detail = state
        .job_application_repository
        .employer_detail(user.id, id)
        .await?;
    Ok(ApiResult::ok(detail, "Application retrieved successfully"))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateApplicationStatusRequest>,
) -> Result<ApiResult<ApplicationResponse>> {
    payload.validate()?;
    let application = state
        .job_application_repository
        .update_status(user.id, id, payload)
        .await?;
    let status: ApplicationStatus = application.status.parse()?;
    state
        .notification_service
        .notify_application_status(
            application.candidate_id,
            &application.job_title,
            &application.company_name,
            status,
        )
        .await;
    Ok(ApiResult::ok(application, "Application status updated successfully"))
}

#[axum::debug_handler]
pub async fn statistics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<ApplicationStatistics>> {
    let stats = state.job_application_repository.statistics(user.id).await?;
    Ok(ApiResult::ok(stats, "Application statistics retrieved successfully"))
}
