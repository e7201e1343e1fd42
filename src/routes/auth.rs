use axum::{
    extract::{Multipart, State},
    middleware::from_fn_with_state,
    routing::post,
    Router,
};
use validator::Validate;

use crate::{
    dto::{
        auth_dto::{
            AuthToken, ForgotPasswordRequest, LoginRequest, RegisterAdminRequest,
            RegisterCandidateRequest, RegisterEmployerRequest, ResetPasswordRequest,
        },
        employer_dto::EmployerProfile,
        envelope::ApiResult,
        profile_dto::UserProfile,
    },
    error::Result,
    extract::ApiJson,
    middleware::auth::require_admin,
    utils::upload::{self, MultipartForm},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin_only = Router::new()
        .route("/register/admin", post(register_admin))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/login", post(login))
        .route("/register/candidate", post(register_candidate))
        .route("/register/employer", post(register_employer))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .merge(admin_only)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ApiResult<AuthToken>> {
    payload.validate()?;
    let token = state.auth_repository.login(payload).await?;
    Ok(ApiResult::ok(token, "Login successful"))
}

#[axum::debug_handler]
pub async fn register_candidate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterCandidateRequest>,
) -> Result<ApiResult<UserProfile>> {
    payload.validate()?;
    let user = state.auth_repository.register_candidate(payload).await?;
    state
        .notification_service
        .welcome(user.id, &user.full_name)
        .await;
    Ok(ApiResult::created(user, "Candidate registered successfully"))
}

/// Multipart registration; the license is checked before anything touches the database.
#[axum::debug_handler]
pub async fn register_employer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResult<EmployerProfile>> {
    let mut form = MultipartForm::read(multipart).await?;
    let (license, _) = upload::accept(&upload::BUSINESS_LICENSE, form.take_file("businessLicense"))?;

    let payload = RegisterEmployerRequest::from_form(&form);
    payload.validate()?;

    let employer = state
        .auth_repository
        .register_employer(payload, license)
        .await?;
    Ok(ApiResult::created(
        employer,
        "Employer registered successfully; the business license is awaiting review",
    ))
}

#[axum::debug_handler]
pub async fn register_admin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterAdminRequest>,
) -> Result<ApiResult<UserProfile>> {
    payload.validate()?;
    let user = state.auth_repository.register_admin(payload).await?;
    Ok(ApiResult::created(user, "Administrator registered successfully"))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<ApiResult<()>> {
    payload.validate()?;
    let (user, token) = state.auth_repository.create_reset_token(&payload.email).await?;
    state
        .email_service
        .send_password_reset(&user.email, &user.full_name, &token)
        .await?;
    Ok(ApiResult::message(
        "Password reset instructions have been sent to your email",
    ))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResult<()>> {
    payload.validate()?;
    state.auth_repository.reset_password(payload).await?;
    Ok(ApiResult::message("Password has been reset successfully"))
}
