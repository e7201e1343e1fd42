use axum::{
    extract::{Multipart, State},
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        candidate_dto::{
            CandidateProfile, CvResponse, EducationRequest, ExperienceRequest,
            UpdateCandidateProfileRequest, UpdateSkillsRequest,
        },
        envelope::ApiResult,
    },
    error::Result,
    extract::{ApiJson, ApiPath, CurrentUser},
    middleware::auth::require_candidate,
    models::candidate::{Education, Experience},
    utils::upload::{self, MultipartForm},
    AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/skills", put(update_skills))
        .route("/cv", put(update_cv))
        .route("/educations", get(list_educations).post(create_education))
        .route(
            "/educations/:id",
            get(get_education)
                .put(update_education)
                .delete(delete_education),
        )
        .route("/experiences", get(list_experiences).post(create_experience))
        .route(
            "/experiences/:id",
            get(get_experience)
                .put(update_experience)
                .delete(delete_experience),
        )
        .route_layer(from_fn_with_state(state.clone(), require_candidate))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<CandidateProfile>> {
    let profile = state.candidate_repository.get_profile(user.id).await?;
    Ok(ApiResult::ok(profile, "Candidate profile retrieved successfully"))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<UpdateCandidateProfileRequest>,
) -> Result<ApiResult<CandidateProfile>> {
    payload.validate()?;
    let profile = state
        .candidate_repository
        .update_profile(user.id, payload)
        .await?;
    Ok(ApiResult::ok(profile, "Candidate profile updated successfully"))
}

#[axum::debug_handler]
pub async fn update_skills(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<UpdateSkillsRequest>,
) -> Result<ApiResult<Vec<String>>> {
    payload.validate()?;
    let skills = state
        .candidate_repository
        .update_skills(user.id, payload.skills)
        .await?;
    Ok(ApiResult::ok(skills, "Skills updated successfully"))
}

#[axum::debug_handler]
pub async fn update_cv(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<ApiResult<CvResponse>> {
    let mut form = MultipartForm::read(multipart).await?;
    let (file, ext) = upload::accept(&upload::PROFILE_CV, form.take_file("file"))?;
    let cv = state
        .candidate_repository
        .update_cv(user.id, file, &ext)
        .await?;
    Ok(ApiResult::ok(cv, "CV uploaded successfully"))
}

#[axum::debug_handler]
pub async fn list_educations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<Vec<Education>>> {
    let items = state.education_repository.list(user.id).await?;
    Ok(ApiResult::ok(items, "Educations retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_education(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<Education>> {
    let item = state.education_repository.get(user.id, id).await?;
    Ok(ApiResult::ok(item, "Education retrieved successfully"))
}

#[axum::debug_handler]
pub async fn create_education(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<EducationRequest>,
) -> Result<ApiResult<Education>> {
    payload.validate()?;
    let item = state.education_repository.create(user.id, payload).await?;
    Ok(ApiResult::created(item, "Education added successfully"))
}

#[axum::debug_handler]
pub async fn update_education(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<EducationRequest>,
) -> Result<ApiResult<Education>> {
    payload.validate()?;
    let item = state
        .education_repository
        .update(user.id, id, payload)
        .await?;
    Ok(ApiResult::ok(item, "Education updated successfully"))
}

#[axum::debug_handler]
pub async fn delete_education(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.education_repository.delete(user.id, id).await?;
    Ok(ApiResult::message("Education deleted successfully"))
}

#[axum::debug_handler]
pub async fn list_experiences(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResult<Vec<Experience>>> {
    let items = state.experience_repository.list(user.id).await?;
    Ok(ApiResult::ok(items, "Experiences retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_experience(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<Experience>> {
    let item = state.experience_repository.get(user.id, id).await?;
    Ok(ApiResult::ok(item, "Experience retrieved successfully"))
}

#[axum::debug_handler]
pub async fn create_experience(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ExperienceRequest>,
) -> Result<ApiResult<Experience>> {
    payload.validate()?;
    let item = state.experience_repository.create(user.id, payload).await?;
    Ok(ApiResult::created(item, "Experience added successfully"))
}

#[axum::debug_handler]
pub async fn update_experience(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ExperienceRequest>,
) -> Result<ApiResult<Experience>> {
    payload.validate()?;
    let item = state
        .experience_repository
        .update(user.id, id, payload)
        .await?;
    Ok(ApiResult::ok(item, "Experience updated successfully"))
}

#[axum::debug_handler]
pub async fn delete_experience(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResult<()>> {
    state.experience_repository.delete(user.id, id).await?;
    Ok(ApiResult::message("Experience deleted successfully"))
}
