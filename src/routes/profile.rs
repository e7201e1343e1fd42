use axum::{
    extract::{Multipart, State},
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use validator::Validate;

use crate::{
    dto::{
        envelope::ApiResult,
        profile_dto::{AvatarResponse, ChangePasswordRequest, UpdateProfileRequest, UserProfile},
    },
    error::Result,
    extract::{ApiJson, CurrentUser},
    middleware::auth::require_auth,
    utils::upload::{self, MultipartForm},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/change-password", put(change_password))
        .route("/avatar", put(update_avatar))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<UserProfile>> {
    let profile = state.profile_repository.get(user.id).await?;
    Ok(ApiResult::ok(profile, "Profile retrieved successfully"))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<ApiResult<UserProfile>> {
    payload.validate()?;
    let profile = state.profile_repository.update(user.id, payload).await?;
    Ok(ApiResult::ok(profile, "Profile updated successfully"))
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResult<()>> {
    payload.validate()?;
    state
        .profile_repository
        .change_password(user.id, payload)
        .await?;
    Ok(ApiResult::message("Password changed successfully"))
}

#[axum::debug_handler]
pub async fn update_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<ApiResult<AvatarResponse>> {
    let mut form = MultipartForm::read(multipart).await?;
    let (file, ext) = upload::accept(&upload::AVATAR, form.take_file("file"))?;
    let avatar = state
        .profile_repository
        .update_avatar(user.id, file, &ext)
        .await?;
    Ok(ApiResult::ok(avatar, "Avatar updated successfully"))
}
