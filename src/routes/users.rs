use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        employer_dto::{EmployerListQuery, EmployerProfile, VerifyEmployerRequest},
        envelope::{ApiResult, PagedResult},
        profile_dto::UserProfile,
        user_dto::{AdminUpdateUserRequest, UpdateUserStatusRequest, UserListQuery},
    },
    error::Result,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    middleware::auth::require_admin,
    models::{employer::VerificationStatus, user::UserStatus},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/employers", get(list_employers))
        .route("/employers/:id/verify", patch(verify_employer))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/status", patch(update_user_status))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<PagedResult<UserProfile>> {
    let (users, total, paging) = state.user_repository.list(&query).await?;
    Ok(PagedResult::new(users, total, paging, "Users retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<UserProfile>> {
    let user = state.user_repository.get(id).await?;
    Ok(ApiResult::ok(user, "User retrieved successfully"))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminUpdateUserRequest>,
) -> Result<ApiResult<UserProfile>> {
    payload.validate()?;
    let user = state.user_repository.update(id, payload).await?;
    Ok(ApiResult::ok(user, "User updated successfully"))
}

#[axum::debug_handler]
pub async fn update_user_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserStatusRequest>,
) -> Result<ApiResult<UserProfile>> {
    let status: UserStatus = payload.status.parse()?;
    let user = state.user_repository.set_status(id, status).await?;
    Ok(ApiResult::ok(user, "User status updated successfully"))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.user_repository.delete(id, admin.id).await?;
    Ok(ApiResult::message("User deleted successfully"))
}

#[axum::debug_handler]
pub async fn list_employers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmployerListQuery>,
) -> Result<PagedResult<EmployerProfile>> {
    let (employers, total, paging) = state.employer_repository.list_for_admin(&query).await?;
    Ok(PagedResult::new(employers, total, paging, "Employers retrieved successfully"))
}

#[axum::debug_handler]
pub async fn verify_employer(
    State(state): State<AppState>,
    admin: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<VerifyEmployerRequest>,
) -> Result<ApiResult<EmployerProfile>> {
    let next: VerificationStatus = payload.status.parse()?;
    let employer = state.employer_repository.verify(id, next).await?;
    tracing::info!(employer_id = %id, admin_id = %admin.id, status = %next, "employer verification decided");
    state
        .notification_service
        .notify_verification(employer.id, &employer.company_name, next)
        .await;
    Ok(ApiResult::ok(employer, format!("Employer {}", next.as_str().to_lowercase())))
}
