use axum::{
    extract::{Multipart, State},
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use validator::Validate;

use crate::{
    dto::{
        employer_dto::{EmployerProfile, UpdateEmployerProfileRequest, VerificationStatusResponse},
        envelope::ApiResult,
    },
    error::Result,
    extract::{ApiJson, CurrentUser},
    middleware::auth::require_employer,
    utils::upload::{self, MultipartForm},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/business-license", put(update_business_license))
        .route("/verification-status", get(verification_status))
        .route_layer(from_fn_with_state(state.clone(), require_employer))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<EmployerProfile>> {
    let profile = state.employer_repository.get_profile(user.id).await?;
    Ok(ApiResult::ok(profile, "Employer profile retrieved successfully"))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<UpdateEmployerProfileRequest>,
) -> Result<ApiResult<EmployerProfile>> {
    payload.validate()?;
    let profile = state
        .employer_repository
        .update_profile(user.id, payload)
        .await?;
    Ok(ApiResult::ok(profile, "Employer profile updated successfully"))
}

/// A new license sends the employer back to Pending review.
#[axum::debug_handler]
pub async fn update_business_license(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<ApiResult<VerificationStatusResponse>> {
    let mut form = MultipartForm::read(multipart).await?;
    let (file, _) = upload::accept(&upload::BUSINESS_LICENSE, form.take_file("businessLicense"))?;
    let status = state
        .employer_repository
        .replace_license(user.id, file)
        .await?;
    Ok(ApiResult::ok(
        status,
        "Business license updated; verification is pending",
    ))
}

#[axum::debug_handler]
pub async fn verification_status(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<VerificationStatusResponse>> {
    let status = state
        .employer_repository
        .verification_status(user.id)
        .await?;
    Ok(ApiResult::ok(status, "Verification status retrieved successfully"))
}
