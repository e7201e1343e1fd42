use sqlx::{types::Json, PgPool};
use std::path::PathBuf;
use uuid::Uuid;

use crate::dto::candidate_dto::{
    normalize_skills, CandidateProfile, CvResponse, UpdateCandidateProfileRequest,
};
use crate::dto::validators::clean;
use crate::error::{Error, Result};
use crate::models::candidate::{
    profile_completeness, Candidate, CompletenessInput, Education, Experience, CANDIDATE_COLUMNS,
};
use crate::utils::upload::{self, UploadedFile};

use super::user_repository;

/// Recomputes and stores the completeness score of one candidate.
pub async fn refresh_completeness(pool: &PgPool, candidate_id: Uuid) -> Result<i32> {
    let input = sqlx::query_as::<_, CompletenessInput>(
        r#"
        SELECT u.full_name, u.email, u.phone, u.address, u.avatar,
               c.desired_position, c.desired_salary, c.years_of_experience, c.skills, c.cv_file_path,
               EXISTS(SELECT 1 FROM educations e WHERE e.candidate_id = c.user_id) AS has_education,
               EXISTS(SELECT 1 FROM experiences x WHERE x.candidate_id = c.user_id) AS has_experience
        FROM candidates c
        JOIN users u ON u.id = c.user_id
        WHERE c.user_id = $1
        "#,
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::not_found("CANDIDATE_NOT_FOUND", "Candidate not found"))?;

    let score = profile_completeness(&input);
    sqlx::query(
        "UPDATE candidates SET profile_completeness = $2, last_updated = NOW() WHERE user_id = $1",
    )
    .bind(candidate_id)
    .bind(score)
    .execute(pool)
    .await?;
    Ok(score)
}

#[derive(Clone)]
pub struct CandidateRepository {
    pool: PgPool,
    uploads_dir: PathBuf,
}

impl CandidateRepository {
    pub fn new(pool: PgPool, uploads_dir: PathBuf) -> Self {
        Self { pool, uploads_dir }
    }

    async fn find(&self, candidate_id: Uuid) -> Result<Candidate> {
        let sql = format!("SELECT {} FROM candidates WHERE user_id = $1", CANDIDATE_COLUMNS);
        sqlx::query_as::<_, Candidate>(&sql)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("CANDIDATE_NOT_FOUND", "Candidate not found"))
    }

    pub async fn get_profile(&self, candidate_id: Uuid) -> Result<CandidateProfile> {
        let candidate = self.find(candidate_id).await?;
        let user = user_repository::get_by_id(&self.pool, candidate_id).await?;

        let educations = sqlx::query_as::<_, Education>(
            "SELECT id, candidate_id, institution_name, degree, major, start_date, end_date, description, created_at
             FROM educations WHERE candidate_id = $1
             ORDER BY start_date DESC NULLS LAST, created_at DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        let experiences = sqlx::query_as::<_, Experience>(
            "SELECT id, candidate_id, company_name, position, start_date, end_date, is_current, description, created_at
             FROM experiences WHERE candidate_id = $1
             ORDER BY is_current DESC, start_date DESC NULLS LAST, created_at DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CandidateProfile::new(
            user.into(),
            candidate,
            educations,
            experiences,
        ))
    }

    pub async fn update_profile(
        &self,
        candidate_id: Uuid,
        req: UpdateCandidateProfileRequest,
    ) -> Result<CandidateProfile> {
        if req.desired_salary.is_some_and(|s| s.is_sign_negative()) {
            return Err(Error::bad_request(
                "INVALID_SALARY",
                "Desired salary must not be negative",
            ));
        }
        let res = sqlx::query(
            "UPDATE candidates SET
                desired_position = COALESCE($2, desired_position),
                desired_salary = COALESCE($3, desired_salary),
                years_of_experience = COALESCE($4, years_of_experience),
                job_type = COALESCE($5, job_type),
                desired_location = COALESCE($6, desired_location),
                last_updated = NOW()
             WHERE user_id = $1",
        )
        .bind(candidate_id)
        .bind(clean(req.desired_position))
        .bind(req.desired_salary)
        .bind(req.years_of_experience)
        .bind(clean(req.job_type))
        .bind(clean(req.desired_location))
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("CANDIDATE_NOT_FOUND", "Candidate not found"));
        }
        refresh_completeness(&self.pool, candidate_id).await?;
        self.get_profile(candidate_id).await
    }

    pub async fn update_skills(&self, candidate_id: Uuid, skills: Vec<String>) -> Result<Vec<String>> {
        let skills = normalize_skills(skills);
        let stored = if skills.is_empty() {
            None
        } else {
            Some(Json(skills.clone()))
        };
        let res = sqlx::query(
            "UPDATE candidates SET skills = $2, last_updated = NOW() WHERE user_id = $1",
        )
        .bind(candidate_id)
        .bind(stored)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found("CANDIDATE_NOT_FOUND", "Candidate not found"));
        }
        refresh_completeness(&self.pool, candidate_id).await?;
        Ok(skills)
    }

    /// Stores a new profile CV (already validated) and removes the previous file.
    pub async fn update_cv(&self, candidate_id: Uuid, file: UploadedFile, ext: &str) -> Result<CvResponse> {
        let previous = self.find(candidate_id).await?.cv_file_path;

        let original_name = upload::sanitize_file_name(&file.file_name);
        let stored_name = format!("{}_{}.{}", candidate_id, Uuid::new_v4(), ext);
        let public_path =
            upload::store(&self.uploads_dir, &upload::PROFILE_CV, &stored_name, &file.data).await?;

        let updated = sqlx::query(
            "UPDATE candidates SET cv_file_name = $2, cv_file_path = $3, cv_uploaded_at = NOW(), last_updated = NOW()
             WHERE user_id = $1",
        )
        .bind(candidate_id)
        .bind(&original_name)
        .bind(&public_path)
        .execute(&self.pool)
        .await;
        if let Err(err) = updated {
            upload::remove(&self.uploads_dir, &public_path).await;
            return Err(err.into());
        }

        if let Some(previous) = previous.filter(|p| p != &public_path) {
            upload::remove(&self.uploads_dir, &previous).await;
        }
        let profile_completeness = refresh_completeness(&self.pool, candidate_id).await?;
        tracing::info!(candidate_id = %candidate_id, "candidate CV replaced");

        Ok(CvResponse {
            cv_file_name: original_name,
            cv_file_path: public_path,
            profile_completeness,
        })
    }

    /// Current profile CV path, if one was uploaded.
    pub async fn profile_cv(&self, candidate_id: Uuid) -> Result<Option<String>> {
        Ok(self.find(candidate_id).await?.cv_file_path)
    }
}
